//! OS keychain slot for the Brevo API key.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Keychain task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, KeychainError>;

/// Keychain entries under one service namespace. Every call runs on the
/// blocking pool since platform keychains may prompt or block.
#[derive(Debug, Clone)]
pub struct KeychainAccess {
    service_name: String,
}

impl KeychainAccess {
    /// Creates access under the `io.smartsend.app` service.
    pub fn new() -> Self {
        Self::with_service("io.smartsend.app")
    }

    /// Uses a separate namespace, e.g. for tests.
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Entry name holding `provider`'s API key.
    pub fn provider_api_key(provider: &str) -> String {
        format!("provider.api_key.{}", provider)
    }

    /// Stores `secret` under `entry`, replacing any previous value.
    pub async fn store(&self, entry: &str, secret: &str) -> Result<()> {
        let secret = secret.to_string();
        self.with_entry(entry, move |e| Ok(e.set_password(&secret)?))
            .await
    }

    /// Reads `entry`; `None` when nothing is stored.
    pub async fn retrieve(&self, entry: &str) -> Result<Option<String>> {
        self.with_entry(entry, |e| match e.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        })
        .await
    }

    /// Removes `entry`. Returns whether anything was stored.
    pub async fn delete(&self, entry: &str) -> Result<bool> {
        self.with_entry(entry, |e| match e.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        })
        .await
    }

    async fn with_entry<T, F>(&self, entry: &str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&keyring::Entry) -> Result<T> + Send + 'static,
    {
        let service = self.service_name.clone();
        let entry = entry.to_string();
        tokio::task::spawn_blocking(move || f(&keyring::Entry::new(&service, &entry)?))
            .await
            .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }
}

impl Default for KeychainAccess {
    fn default() -> Self {
        Self::new()
    }
}
