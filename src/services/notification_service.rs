//! User-facing notifications.
//!
//! Services report outcomes as [`Notification`] values handed to a
//! [`Notifier`]. The CLI prints them; tests collect them with
//! [`NotificationLog`].

use std::sync::Mutex;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Icon shown next to the title.
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Success => "✅",
            NotificationLevel::Warning => "⚠️",
            NotificationLevel::Error => "❌",
        }
    }
}

/// A notification to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(
        level: NotificationLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, "Success", message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, "Error", message)
    }

    /// Every recipient was sent to.
    pub fn batch_sent(sent: usize) -> Self {
        Self::success(format!("All {} email(s) sent successfully! 🎉", sent))
    }

    /// Some sends failed.
    pub fn batch_partial(sent: usize, failed: usize) -> Self {
        Self::new(
            NotificationLevel::Warning,
            "Partial Success",
            format!("{} sent, {} failed", sent, failed),
        )
    }

    /// Nothing was sent.
    pub fn batch_failed() -> Self {
        Self::new(NotificationLevel::Error, "Failed", "No emails were sent")
    }

    /// The API key is missing.
    pub fn credential_missing() -> Self {
        Self::new(
            NotificationLevel::Warning,
            "Warning",
            "Brevo API key not configured. Set BREVO_API_KEY or run `smartsend config set-key`",
        )
    }

    /// The batch ran but its report could not be saved.
    pub fn report_not_saved(reason: impl std::fmt::Display) -> Self {
        Self::new(
            NotificationLevel::Warning,
            "Report not saved",
            format!(
                "The report below is only shown once and will not be available from `smartsend report`: {}",
                reason
            ),
        )
    }
}

/// Receives notifications for display.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Collects notifications in memory.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    /// Returns the newest notification.
    pub fn last(&self) -> Option<Notification> {
        self.lock().last().cloned()
    }

    /// Returns every notification received, oldest first.
    pub fn all(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}
