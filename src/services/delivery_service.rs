//! Batch sending for a session.
//!
//! Ties the recipient parser, the [`DeliveryEngine`], the session's report
//! slot and busy flag, and the notifier together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::delivery_engine::{DeliveryEngine, DeliveryError, DeliveryObserver, Pacer, Result};
use super::notification_service::{Notification, Notifier};
use super::session_service::Session;
use crate::domain::{parse_recipients, BatchStatus, DeliveryReport, MessageDraft, RejectedLine};
use crate::providers::email::MailTransport;
use crate::storage::KeyValueStore;

/// A finished batch and the input lines that were skipped.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub report: DeliveryReport,
    pub rejected: Vec<RejectedLine>,
}

/// Runs batches on behalf of a session.
pub struct DeliveryService<S: KeyValueStore, T: MailTransport, P: Pacer> {
    session: Arc<Session<S>>,
    engine: DeliveryEngine<T, P>,
    notifier: Arc<dyn Notifier>,
}

impl<S: KeyValueStore, T: MailTransport, P: Pacer> DeliveryService<S, T, P> {
    pub fn new(
        session: Arc<Session<S>>,
        engine: DeliveryEngine<T, P>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            engine,
            notifier,
        }
    }

    pub fn session(&self) -> &Arc<Session<S>> {
        &self.session
    }

    /// Parses `raw_recipients` and sends `draft` to every valid address.
    ///
    /// A refused batch leaves the previous report in place and emits an
    /// error notification. An accepted batch replaces the report and emits
    /// a summary notification. Failing to persist the report does not fail
    /// the batch; the report stays in memory and a warning is emitted.
    pub async fn send_batch(
        &self,
        raw_recipients: &str,
        draft: &MessageDraft,
        observer: &dyn DeliveryObserver,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        match self.try_send(raw_recipients, draft, observer, cancel).await {
            Ok(summary) => {
                self.notifier.notify(summary_notification(&summary.report));
                Ok(summary)
            }
            Err(e) => {
                let notification = match e {
                    DeliveryError::MissingCredential => Notification::credential_missing(),
                    _ => Notification::error(e.to_string()),
                };
                self.notifier.notify(notification);
                Err(e)
            }
        }
    }

    async fn try_send(
        &self,
        raw_recipients: &str,
        draft: &MessageDraft,
        observer: &dyn DeliveryObserver,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        let sender = self.session.sender().await;
        let recipients = parse_recipients(raw_recipients);
        for line in &recipients.rejected {
            tracing::debug!(line = line.line, text = %line.text, reason = %line.reason, "Skipping recipient line");
        }

        self.engine
            .check_preconditions(sender.as_deref(), &recipients, draft)?;
        let _guard = self.session.begin_batch()?;

        self.session.new_batch().await?;
        let report = self
            .engine
            .run(sender.as_deref(), &recipients, draft, observer, cancel)
            .await?;
        if let Err(e) = self.session.replace_report(report.clone()).await {
            tracing::warn!(batch = %report.id(), error = %e, "Could not save delivery report");
            self.notifier.notify(Notification::report_not_saved(e));
        }

        Ok(BatchSummary {
            report,
            rejected: recipients.rejected,
        })
    }
}

/// Picks the summary notification for a finished batch.
pub fn summary_notification(report: &DeliveryReport) -> Notification {
    match report.status() {
        BatchStatus::Success => Notification::batch_sent(report.sent_count()),
        BatchStatus::PartialSuccess => {
            Notification::batch_partial(report.sent_count(), report.failed_count())
        }
        BatchStatus::Failed => Notification::batch_failed(),
    }
}
