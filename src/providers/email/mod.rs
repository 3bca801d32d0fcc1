//! Email provider implementations.
//!
//! This module contains the [`MailTransport`] trait and the
//! [`BrevoProvider`] implementation for Brevo's transactional email API.
//!
//! # Example
//!
//! ```ignore
//! use smartsend::config::ApiKey;
//! use smartsend::providers::email::{BrevoProvider, MailTransport};
//!
//! let provider = BrevoProvider::new(ApiKey::new("xkeysib-..."));
//! assert!(provider.is_configured());
//! ```

mod brevo;
mod traits;

pub use brevo::BrevoProvider;
pub use traits::{MailTransport, OutgoingEmail, ProviderError, Result, SendReceipt};
