//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SWIFTCART_CATALOG_URL` - Catalog API base URL (default: <https://fakestoreapi.com>)
//! - `SWIFTCART_CATALOG_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `SWIFTCART_CATALOG_CACHE_TTL_SECS` - Response cache TTL, 0 disables (default: 300)
//! - `SWIFTCART_DATA_DIR` - Directory holding the persisted cart (default: .swiftcart)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Public catalog API used when no override is configured.
pub const DEFAULT_CATALOG_URL: &str = "https://fakestoreapi.com";

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_DATA_DIR: &str = ".swiftcart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Catalog API settings
    pub catalog: CatalogConfig,
    /// Directory holding the persisted cart slot
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production")
    pub sentry_environment: Option<String>,
}

/// Remote catalog API configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL the catalog paths are appended to (no trailing slash)
    pub base_url: String,
    /// Request timeout; `None` waits for the server indefinitely
    pub timeout: Option<Duration>,
    /// How long successful responses are reused; zero disables caching
    pub cache_ttl: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            timeout: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = match non_empty(lookup("SWIFTCART_CATALOG_URL")) {
            Some(raw) => parse_base_url("SWIFTCART_CATALOG_URL", &raw)?,
            None => DEFAULT_CATALOG_URL.to_string(),
        };

        let timeout = non_empty(lookup("SWIFTCART_CATALOG_TIMEOUT_SECS"))
            .map(|raw| parse_secs("SWIFTCART_CATALOG_TIMEOUT_SECS", &raw))
            .transpose()?;

        let cache_ttl = non_empty(lookup("SWIFTCART_CATALOG_CACHE_TTL_SECS"))
            .map_or(Ok(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)), |raw| {
                parse_secs("SWIFTCART_CATALOG_CACHE_TTL_SECS", &raw)
            })?;

        let data_dir = non_empty(lookup("SWIFTCART_DATA_DIR"))
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        Ok(Self {
            catalog: CatalogConfig {
                base_url,
                timeout,
                cache_ttl,
            },
            data_dir,
            sentry_dsn: non_empty(lookup("SENTRY_DSN")),
            sentry_environment: non_empty(lookup("SENTRY_ENVIRONMENT")),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate an absolute http(s) URL and strip any trailing slash.
fn parse_base_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Treat empty variables as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
