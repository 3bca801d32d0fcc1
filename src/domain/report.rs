//! Delivery outcomes and the per-batch report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, BatchId};

/// Result of a single send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// The provider accepted the message.
    Sent,
    /// The provider rejected the message or could not be reached.
    Failed,
}

impl DeliveryStatus {
    /// Human-readable label for tables.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "✅ Sent",
            DeliveryStatus::Failed => "❌ Failed",
        }
    }
}

/// The status assigned to one recipient within one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Recipient address.
    pub address: Address,
    /// Send result.
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn sent(address: Address) -> Self {
        Self {
            address,
            status: DeliveryStatus::Sent,
        }
    }

    pub fn failed(address: Address) -> Self {
        Self {
            address,
            status: DeliveryStatus::Failed,
        }
    }
}

/// Overall verdict for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every attempt succeeded.
    Success,
    /// Some attempts succeeded and some failed.
    PartialSuccess,
    /// Nothing was sent.
    Failed,
}

/// Ordered outcomes of one batch run.
///
/// A report is built by the delivery engine and is read-only afterwards.
/// Each run produces a fresh report; reports are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    id: BatchId,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    outcomes: Vec<DeliveryOutcome>,
    cancelled: bool,
}

impl DeliveryReport {
    pub(crate) fn begin(id: BatchId, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            finished_at: None,
            outcomes: Vec::new(),
            cancelled: false,
        }
    }

    pub(crate) fn record(&mut self, outcome: DeliveryOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn finish(&mut self, finished_at: DateTime<Utc>, cancelled: bool) {
        self.finished_at = Some(finished_at);
        self.cancelled = cancelled;
    }

    /// Batch identifier.
    pub fn id(&self) -> &BatchId {
        &self.id
    }

    /// When the first send was attempted.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the run ended, if it has.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Outcomes in the order recipients were submitted.
    pub fn outcomes(&self) -> &[DeliveryOutcome] {
        &self.outcomes
    }

    /// Whether the run stopped before reaching every recipient.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn sent_count(&self) -> usize {
        self.count(DeliveryStatus::Sent)
    }

    pub fn failed_count(&self) -> usize {
        self.count(DeliveryStatus::Failed)
    }

    /// Overall verdict derived from the counts.
    pub fn status(&self) -> BatchStatus {
        let sent = self.sent_count();
        let failed = self.failed_count();

        if sent == 0 {
            BatchStatus::Failed
        } else if failed == 0 {
            BatchStatus::Success
        } else {
            BatchStatus::PartialSuccess
        }
    }

    fn count(&self, status: DeliveryStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
