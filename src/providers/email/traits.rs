//! Mail transport trait definition.
//!
//! This module defines the [`MailTransport`] trait which abstracts over
//! transactional email services. The delivery engine only talks to this
//! trait, so tests can substitute a recording fake.

use async_trait::async_trait;

use crate::domain::Address;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while handing a message to a provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No usable credential, or the provider refused it.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error, including timeouts.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// The request could not be built or was rejected as invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other non-success response.
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },
}

/// A single-recipient message ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Sender display name.
    pub sender_name: String,
    /// Sender address (the logged-in identity).
    pub from: String,
    /// The one recipient of this message.
    pub to: Address,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body_text: String,
    /// HTML body.
    pub body_html: String,
}

/// What a provider returns for an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// Provider-assigned message id, when the response carried one.
    pub message_id: Option<String>,
}

/// A service that accepts one message per call.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Whether a usable credential is present. Checked before any batch.
    fn is_configured(&self) -> bool;

    /// Sends one message. Any `Err` counts as a failed delivery.
    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt>;
}
