//! External service providers.
//!
//! - [`email`] - Transactional email transports (Brevo)

pub mod email;
