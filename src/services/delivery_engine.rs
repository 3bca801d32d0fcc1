//! Batch delivery engine.
//!
//! Sends one message per recipient through a [`MailTransport`], strictly in
//! order, pausing between sends. A failed send is recorded and the loop moves
//! on; nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::session_service::SessionError;
use crate::config::{DEFAULT_PACING_MS, DEFAULT_SENDER_NAME, DEFAULT_SUBJECT};
use crate::domain::{
    Address, BatchId, DeliveryOutcome, DeliveryReport, MessageDraft, ParsedRecipients,
};
use crate::providers::email::{MailTransport, OutgoingEmail};
use crate::storage::DatabaseError;

/// Reasons a batch is refused before anything is sent.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("not logged in: set a sender address with `smartsend login <email>`")]
    MissingSender,

    #[error("Brevo API key not configured")]
    MissingCredential,

    #[error("no valid recipient addresses")]
    NoValidRecipients,

    #[error("message is empty")]
    EmptyMessage,

    #[error("a batch is already being sent")]
    BatchInProgress,

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<SessionError> for DeliveryError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidIdentity(_) => DeliveryError::MissingSender,
            SessionError::BatchInProgress => DeliveryError::BatchInProgress,
            SessionError::Storage(e) => DeliveryError::Storage(e),
        }
    }
}

/// Result type for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Waits between consecutive sends.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Pacer backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Progress callbacks for a running batch. All methods default to no-ops.
pub trait DeliveryObserver: Send + Sync {
    /// Called once before the first send.
    fn on_started(&self, _total: usize) {}

    /// Called after each attempt with its 0-based position.
    fn on_outcome(&self, _index: usize, _outcome: &DeliveryOutcome) {}

    /// Called once with the finished report.
    fn on_finished(&self, _report: &DeliveryReport) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DeliveryObserver for NoopObserver {}

/// Fixed parts of every outgoing message. Production code uses the
/// defaults; tests inject shorter pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Sender display name.
    pub sender_name: String,
    /// Subject line.
    pub subject: String,
    /// Pause between consecutive sends.
    pub pacing: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sender_name: DEFAULT_SENDER_NAME.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
        }
    }
}

/// Sequential, paced batch sender.
pub struct DeliveryEngine<T: MailTransport, P: Pacer = TokioPacer> {
    transport: Arc<T>,
    pacer: P,
    options: EngineOptions,
}

impl<T: MailTransport> DeliveryEngine<T, TokioPacer> {
    /// Creates an engine that paces with the tokio timer.
    pub fn new(transport: Arc<T>, options: EngineOptions) -> Self {
        Self::with_pacer(transport, TokioPacer, options)
    }
}

impl<T: MailTransport, P: Pacer> DeliveryEngine<T, P> {
    pub fn with_pacer(transport: Arc<T>, pacer: P, options: EngineOptions) -> Self {
        Self {
            transport,
            pacer,
            options,
        }
    }

    /// Checks sender, credential, recipients and message, in that order.
    pub fn check_preconditions<'a>(
        &self,
        sender: Option<&'a str>,
        recipients: &ParsedRecipients,
        draft: &MessageDraft,
    ) -> Result<&'a str> {
        let sender = sender
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(DeliveryError::MissingSender)?;
        if !self.transport.is_configured() {
            return Err(DeliveryError::MissingCredential);
        }
        if recipients.is_empty() {
            return Err(DeliveryError::NoValidRecipients);
        }
        if draft.is_blank() {
            return Err(DeliveryError::EmptyMessage);
        }
        Ok(sender)
    }

    /// Sends `draft` to every valid recipient and returns the report.
    ///
    /// Preconditions are checked first; a refused batch makes no requests.
    /// Once sending starts the run always produces a report, even if every
    /// send fails or the token is cancelled part way through.
    pub async fn run(
        &self,
        sender: Option<&str>,
        recipients: &ParsedRecipients,
        draft: &MessageDraft,
        observer: &dyn DeliveryObserver,
        cancel: &CancellationToken,
    ) -> Result<DeliveryReport> {
        let sender = self.check_preconditions(sender, recipients, draft)?;
        let total = recipients.len();

        let mut report = DeliveryReport::begin(BatchId::generate(), Utc::now());
        tracing::info!(
            batch = %report.id(),
            provider = self.transport.name(),
            recipients = total,
            rejected = recipients.rejected.len(),
            "Starting batch"
        );
        observer.on_started(total);

        let html = draft.html_content();
        let mut cancelled = false;

        for (index, address) in recipients.valid.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let outcome = self.deliver(sender, address, draft, &html).await;
            observer.on_outcome(index, &outcome);
            report.record(outcome);

            if index + 1 < total {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    _ = self.pacer.pause(self.options.pacing) => {}
                }
            }
        }

        report.finish(Utc::now(), cancelled);
        if cancelled {
            tracing::warn!(
                batch = %report.id(),
                attempted = report.total(),
                remaining = total - report.total(),
                "Batch cancelled"
            );
        }
        tracing::info!(
            batch = %report.id(),
            sent = report.sent_count(),
            failed = report.failed_count(),
            status = ?report.status(),
            "Batch finished"
        );
        observer.on_finished(&report);

        Ok(report)
    }

    async fn deliver(
        &self,
        sender: &str,
        address: &Address,
        draft: &MessageDraft,
        html: &str,
    ) -> DeliveryOutcome {
        let email = OutgoingEmail {
            sender_name: self.options.sender_name.clone(),
            from: sender.to_string(),
            to: address.clone(),
            subject: self.options.subject.clone(),
            body_text: draft.text_content().to_string(),
            body_html: html.to_string(),
        };

        match self.transport.send(&email).await {
            Ok(_) => DeliveryOutcome::sent(address.clone()),
            Err(e) => {
                tracing::warn!(recipient = %address, error = %e, "Send failed");
                DeliveryOutcome::failed(address.clone())
            }
        }
    }
}
