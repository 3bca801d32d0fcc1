//! Session state: sender identity, theme preference, the last delivery
//! report and the busy flag for the running batch.
//!
//! Everything except the busy flag is mirrored to the durable store so it
//! survives restarts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::Theme;
use crate::domain::DeliveryReport;
use crate::storage::{get_json, set_json, DatabaseError, KeyValueStore};

/// Storage key for the logged-in sender address.
pub const SENDER_KEY: &str = "sender_identity";
/// Storage key for the theme preference.
pub const THEME_KEY: &str = "theme";
/// Storage key for the most recent delivery report.
pub const REPORT_KEY: &str = "last_report";

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("'{0}' is not an email address")]
    InvalidIdentity(String),

    #[error("a batch is already being sent")]
    BatchInProgress,

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Explicit session context owned by the application and passed to services.
pub struct Session<S: KeyValueStore> {
    store: Arc<S>,
    sender: RwLock<Option<String>>,
    theme: RwLock<Theme>,
    last_report: RwLock<Option<DeliveryReport>>,
    busy: Arc<AtomicBool>,
}

impl<S: KeyValueStore> Session<S> {
    /// Restores a session from the store. `default_theme` applies when no
    /// preference has been saved.
    pub async fn restore(store: Arc<S>, default_theme: Theme) -> Result<Self> {
        let sender = store.get(SENDER_KEY).await?;
        let theme = store
            .get(THEME_KEY)
            .await?
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or(default_theme);

        // An unreadable report is dropped rather than blocking startup.
        let last_report = match get_json::<S, DeliveryReport>(store.as_ref(), REPORT_KEY).await {
            Ok(report) => report,
            Err(DatabaseError::Malformed { message, .. }) => {
                tracing::warn!("Discarding unreadable delivery report: {}", message);
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            store,
            sender: RwLock::new(sender),
            theme: RwLock::new(theme),
            last_report: RwLock::new(last_report),
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Sets the sender identity. The value must contain an `@`.
    pub async fn login(&self, email: &str) -> Result<String> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(SessionError::InvalidIdentity(email.to_string()));
        }

        self.store.set(SENDER_KEY, email).await?;
        *self.sender.write().await = Some(email.to_string());
        tracing::info!(sender = %email, "Logged in");
        Ok(email.to_string())
    }

    /// Clears the sender identity.
    pub async fn logout(&self) -> Result<()> {
        self.store.remove(SENDER_KEY).await?;
        *self.sender.write().await = None;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Returns the current sender identity.
    pub async fn sender(&self) -> Option<String> {
        self.sender.read().await.clone()
    }

    pub async fn theme(&self) -> Theme {
        *self.theme.read().await
    }

    /// Saves a theme preference.
    pub async fn set_theme(&self, theme: Theme) -> Result<Theme> {
        self.store.set(THEME_KEY, theme.as_str()).await?;
        *self.theme.write().await = theme;
        Ok(theme)
    }

    /// Switches between dark and light.
    pub async fn toggle_theme(&self) -> Result<Theme> {
        let next = self.theme().await.toggled();
        self.set_theme(next).await
    }

    /// Returns the most recent delivery report.
    pub async fn last_report(&self) -> Option<DeliveryReport> {
        self.last_report.read().await.clone()
    }

    /// Replaces the stored report wholesale.
    pub async fn replace_report(&self, report: DeliveryReport) -> Result<()> {
        *self.last_report.write().await = Some(report.clone());
        set_json(self.store.as_ref(), REPORT_KEY, &report).await?;
        Ok(())
    }

    /// Hides the previous report ahead of a new batch.
    pub async fn new_batch(&self) -> Result<()> {
        self.store.remove(REPORT_KEY).await?;
        *self.last_report.write().await = None;
        Ok(())
    }

    /// Marks the session busy until the returned guard is dropped.
    pub fn begin_batch(&self) -> Result<BatchGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::BatchInProgress);
        }
        Ok(BatchGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Whether a batch is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the session's busy flag on drop.
#[derive(Debug)]
pub struct BatchGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    async fn session() -> (Arc<Database>, Session<Database>) {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let session = Session::restore(Arc::clone(&db), Theme::Dark)
            .await
            .unwrap();
        (db, session)
    }

    #[tokio::test]
    async fn login_persists_identity() {
        let (db, session) = session().await;
        assert_eq!(session.sender().await, None);

        session.login("  me@example.com ").await.unwrap();
        assert_eq!(session.sender().await, Some("me@example.com".to_string()));

        let restored = Session::restore(db, Theme::Dark).await.unwrap();
        assert_eq!(restored.sender().await, Some("me@example.com".to_string()));
    }

    #[tokio::test]
    async fn login_requires_at_sign() {
        let (_, session) = session().await;
        let result = session.login("nobody").await;
        assert!(matches!(result, Err(SessionError::InvalidIdentity(_))));
        assert_eq!(session.sender().await, None);
    }

    #[tokio::test]
    async fn logout_clears_identity() {
        let (db, session) = session().await;
        session.login("me@example.com").await.unwrap();
        session.logout().await.unwrap();

        assert_eq!(session.sender().await, None);
        assert_eq!(db.get(SENDER_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn theme_defaults_and_toggles() {
        let (db, session) = session().await;
        assert_eq!(session.theme().await, Theme::Dark);

        assert_eq!(session.toggle_theme().await.unwrap(), Theme::Light);
        assert_eq!(db.get(THEME_KEY).await.unwrap(), Some("light".to_string()));

        let restored = Session::restore(db, Theme::Dark).await.unwrap();
        assert_eq!(restored.theme().await, Theme::Light);
    }

    #[tokio::test]
    async fn unknown_theme_falls_back_to_default() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        db.set(THEME_KEY, "sepia").await.unwrap();

        let session = Session::restore(db, Theme::Light).await.unwrap();
        assert_eq!(session.theme().await, Theme::Light);
    }

    #[tokio::test]
    async fn malformed_report_is_discarded() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        db.set(REPORT_KEY, "garbage").await.unwrap();

        let session = Session::restore(db, Theme::Dark).await.unwrap();
        assert!(session.last_report().await.is_none());
    }

    #[tokio::test]
    async fn busy_guard_is_exclusive() {
        let (_, session) = session().await;

        let guard = session.begin_batch().unwrap();
        assert!(session.is_busy());
        assert!(matches!(
            session.begin_batch(),
            Err(SessionError::BatchInProgress)
        ));

        drop(guard);
        assert!(!session.is_busy());
        assert!(session.begin_batch().is_ok());
    }
}
