//! Application settings and configuration types.
//!
//! Settings are persisted to `~/.config/smartsend/settings.json` (or the
//! platform equivalent) and loaded at startup. A missing file means defaults;
//! missing fields in an existing file fall back to their defaults too.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default Brevo transactional email endpoint.
pub const DEFAULT_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

/// Display name used for the sender on every message. Not configurable.
pub const DEFAULT_SENDER_NAME: &str = "Smart Send";

/// Subject line used on every message. Not configurable.
pub const DEFAULT_SUBJECT: &str = "Message from Smart Send";

/// Pause between two consecutive sends, in milliseconds. Not configurable.
pub const DEFAULT_PACING_MS: u64 = 300;

/// Per-request timeout used when the settings file does not set one.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid provider URL '{0}'")]
    InvalidUrl(String),

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("Could not determine a home directory")]
    NoHomeDir,
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Email provider configuration.
    pub provider: ProviderSettings,
    /// Visual appearance settings.
    pub appearance: AppearanceSettings,
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults if it is missing.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes settings to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.provider.api_url)
            .map_err(|_| ConfigError::InvalidUrl(self.provider.api_url.clone()))?;
        if self.provider.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Standard locations for the settings file and database.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Settings file.
    pub settings_file: PathBuf,
    /// SQLite database file.
    pub database_file: PathBuf,
}

impl AppPaths {
    /// Resolves platform directories for smartsend.
    pub fn discover() -> Result<Self> {
        let dirs = ProjectDirs::from("io", "smartsend", "smartsend").ok_or(ConfigError::NoHomeDir)?;
        Ok(Self {
            settings_file: dirs.config_dir().join("settings.json"),
            database_file: dirs.data_dir().join("smartsend.db"),
        })
    }
}

/// Email provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Send endpoint.
    pub api_url: String,
    /// API key, lowest-priority source; prefer the keychain or environment.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Visual appearance configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSettings {
    /// Theme used when no preference has been saved.
    pub theme: Theme,
}

/// Color theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark color scheme.
    #[default]
    Dark,
    /// Light color scheme.
    Light,
}

impl Theme {
    /// Returns the other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Parses a stored or user-supplied theme name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.provider.api_url, DEFAULT_API_URL);
        assert_eq!(settings.provider.request_timeout_secs, 30);
        assert!(settings.provider.api_key.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn theme_serialization() {
        let json = serde_json::to_string(&Theme::Dark).unwrap();
        assert_eq!(json, "\"dark\"");

        let deserialized: Theme = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(deserialized, Theme::Light);
    }

    #[test]
    fn theme_toggle_and_parse() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::parse(" Light "), Some(Theme::Light));
        assert_eq!(Theme::parse("sepia"), None);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"provider": {"request_timeout_secs": 5}}"#).unwrap();
        assert_eq!(settings.provider.request_timeout_secs, 5);
        assert_eq!(settings.provider.api_url, DEFAULT_API_URL);
        assert_eq!(settings.appearance.theme, Theme::Dark);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(
            settings.provider.request_timeout_secs,
            DEFAULT_REQUEST_TIMEOUT_SECS
        );
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.appearance.theme = Theme::Light;
        settings.provider.request_timeout_secs = 5;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.appearance.theme, Theme::Light);
        assert_eq!(loaded.provider.request_timeout_secs, 5);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"provider": {"api_url": "not a url"}}"#).unwrap();

        let result = Settings::load(&path);
        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{").unwrap();

        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn message_constants_ignore_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"provider": {"sender_name": "Other", "subject": "Hi"}, "delivery": {"pacing_ms": 0}}"#,
        )
        .unwrap();

        let loaded = Settings::load(&path).unwrap();
        let json = serde_json::to_value(&loaded).unwrap();
        assert!(json.get("delivery").is_none());
        assert!(json["provider"].get("sender_name").is_none());
        assert!(json["provider"].get("subject").is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"provider": {"request_timeout_secs": 0}}"#).unwrap();

        assert!(matches!(Settings::load(&path), Err(ConfigError::ZeroTimeout)));
    }
}
