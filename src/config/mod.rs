//! Configuration and settings management.
//!
//! Settings are stored in the user's config directory as JSON. The provider
//! API key is resolved separately, see [`resolve_api_key`].

mod credentials;
mod settings;

pub use credentials::{
    first_configured, is_configured, parse_dotenv, resolve_api_key, ApiKey, CredentialSource,
    API_KEY_ENV, PLACEHOLDER_API_KEY, PROVIDER_NAME,
};
pub use settings::{
    AppPaths, AppearanceSettings, ConfigError, ProviderSettings, Settings, Theme, DEFAULT_API_URL,
    DEFAULT_PACING_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SENDER_NAME, DEFAULT_SUBJECT,
};
