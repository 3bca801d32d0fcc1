//! Provider API key resolution.
//!
//! The key is looked up, in order, in the `BREVO_API_KEY` environment
//! variable, a `BREVO_API_KEY=` line in a `.env` file, the OS keychain, and
//! finally the settings file. Blank values and the shipped placeholder are
//! treated as absent.

use std::fmt;
use std::path::Path;

use crate::storage::KeychainAccess;

use super::Settings;

/// Environment variable and `.env` key holding the API key.
pub const API_KEY_ENV: &str = "BREVO_API_KEY";

/// Placeholder value that means "not configured".
pub const PLACEHOLDER_API_KEY: &str = "YOUR_BREVO_API_KEY";

/// Keychain provider name for the Brevo key.
pub const PROVIDER_NAME: &str = "brevo";

/// A provider API key. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key, rejecting blank values and the placeholder.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();
        if is_configured(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    DotEnv,
    Keychain,
    Settings,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CredentialSource::Environment => "environment",
            CredentialSource::DotEnv => ".env file",
            CredentialSource::Keychain => "keychain",
            CredentialSource::Settings => "settings file",
        };
        f.write_str(name)
    }
}

/// Returns whether `value` is a usable key.
pub fn is_configured(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != PLACEHOLDER_API_KEY
}

/// Extracts the API key from `.env` file contents.
///
/// The last `BREVO_API_KEY=` line wins. Lines without `=` are ignored.
pub fn parse_dotenv(content: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(key, value)| key.trim() == API_KEY_ENV && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
        .last()
}

/// Picks the first configured key from candidates in priority order.
pub fn first_configured<I>(candidates: I) -> Option<(CredentialSource, ApiKey)>
where
    I: IntoIterator<Item = (CredentialSource, Option<String>)>,
{
    candidates
        .into_iter()
        .find_map(|(source, value)| {
            value
                .and_then(|value| ApiKey::new(value))
                .map(|key| (source, key))
        })
}

/// Resolves the API key from all sources.
///
/// Keychain failures are logged and skipped rather than returned, so a
/// missing platform keychain never hides a key set elsewhere.
pub async fn resolve_api_key(
    settings: &Settings,
    keychain: Option<&KeychainAccess>,
    dotenv_path: &Path,
) -> Option<(CredentialSource, ApiKey)> {
    let env = std::env::var(API_KEY_ENV).ok();
    let dotenv = match std::fs::read_to_string(dotenv_path) {
        Ok(content) => parse_dotenv(&content),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %dotenv_path.display(), "Could not read .env file: {}", e);
            }
            None
        }
    };

    let stored = match keychain {
        Some(keychain) => match keychain
            .retrieve(&KeychainAccess::provider_api_key(PROVIDER_NAME))
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Keychain lookup failed: {}", e);
                None
            }
        },
        None => None,
    };

    let resolved = first_configured([
        (CredentialSource::Environment, env),
        (CredentialSource::DotEnv, dotenv),
        (CredentialSource::Keychain, stored),
        (CredentialSource::Settings, settings.provider.api_key.clone()),
    ]);

    match &resolved {
        Some((source, _)) => tracing::debug!(%source, "Resolved provider API key"),
        None => tracing::warn!("Brevo API key not configured"),
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_not_configured() {
        assert!(!is_configured(PLACEHOLDER_API_KEY));
        assert!(!is_configured("   "));
        assert!(is_configured("xkeysib-123"));
        assert!(ApiKey::new("YOUR_BREVO_API_KEY").is_none());
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("xkeysib-secret").unwrap();
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
        assert_eq!(key.expose(), "xkeysib-secret");
    }

    #[test]
    fn dotenv_parsing() {
        let content = "# comment\nOTHER=1\n BREVO_API_KEY = xkeysib-abc \n";
        assert_eq!(parse_dotenv(content), Some("xkeysib-abc".to_string()));

        assert_eq!(parse_dotenv("BREVO_API_KEY=\n"), None);
        assert_eq!(parse_dotenv("nothing here"), None);
    }

    #[test]
    fn dotenv_keeps_equals_in_value() {
        assert_eq!(
            parse_dotenv("BREVO_API_KEY=abc==\n"),
            Some("abc==".to_string())
        );
    }

    #[test]
    fn first_configured_skips_placeholders() {
        let resolved = first_configured([
            (CredentialSource::Environment, None),
            (
                CredentialSource::DotEnv,
                Some(PLACEHOLDER_API_KEY.to_string()),
            ),
            (CredentialSource::Keychain, Some("from-keychain".to_string())),
            (CredentialSource::Settings, Some("from-settings".to_string())),
        ]);

        let (source, key) = resolved.unwrap();
        assert_eq!(source, CredentialSource::Keychain);
        assert_eq!(key.expose(), "from-keychain");
    }

    #[test]
    fn nothing_configured() {
        let resolved = first_configured([
            (CredentialSource::Environment, None),
            (CredentialSource::Settings, Some(String::new())),
        ]);
        assert!(resolved.is_none());
    }
}
