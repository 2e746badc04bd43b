//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MERIDIAN_API_URL` - Base URL of the shop API (e.g., <https://api.meridiansupply.dev>)
//!
//! ## Optional
//! - `MERIDIAN_REQUEST_TIMEOUT_MS` - HTTP request timeout (default: 10000)
//! - `MERIDIAN_STALE_CATALOG_MS` - Catalog listing staleness window (default: 5000)
//! - `MERIDIAN_STALE_PRODUCT_MS` - Product detail staleness window (default: 30000)
//! - `MERIDIAN_STALE_CATEGORIES_MS` - Category tree staleness window (default: 300000)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Staleness windows per resource family.
///
/// The cart has no window: cached cart data is always treated as stale and
/// revalidated, since any tab or device can change it.
#[derive(Debug, Clone, Copy)]
pub struct StalenessConfig {
    /// Catalog listings (short - filters change often).
    pub catalog: Duration,
    /// Product detail pages.
    pub product: Duration,
    /// Category tree (changes rarely).
    pub categories: Duration,
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            catalog: Duration::from_secs(5),
            product: Duration::from_secs(30),
            categories: Duration::from_secs(300),
        }
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the shop API.
    pub api_url: Url,
    /// HTTP request timeout.
    pub request_timeout: Duration,
    /// Per-resource staleness windows.
    pub staleness: StalenessConfig,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `MERIDIAN_API_URL` is missing or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("MERIDIAN_API_URL")?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("MERIDIAN_API_URL".to_string(), e.to_string()))?;

        let request_timeout = get_duration_ms("MERIDIAN_REQUEST_TIMEOUT_MS", 10_000)?;

        let staleness = StalenessConfig {
            catalog: get_duration_ms("MERIDIAN_STALE_CATALOG_MS", 5_000)?,
            product: get_duration_ms("MERIDIAN_STALE_PRODUCT_MS", 30_000)?,
            categories: get_duration_ms("MERIDIAN_STALE_CATEGORIES_MS", 300_000)?,
        };

        Ok(Self {
            api_url,
            request_timeout,
            staleness,
        })
    }

    /// Build a config pointing at the given base URL with default timeouts,
    /// used by tests and tools that do not read the environment.
    #[must_use]
    pub fn for_base_url(api_url: Url) -> Self {
        Self {
            api_url,
            request_timeout: Duration::from_secs(10),
            staleness: StalenessConfig::default(),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional millisecond duration from the environment.
fn get_duration_ms(key: &str, default_ms: u64) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_duration_ms(&value)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e)),
        Err(_) => Ok(Duration::from_millis(default_ms)),
    }
}

/// Parse a non-negative millisecond count.
fn parse_duration_ms(value: &str) -> Result<Duration, String> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_ms_valid() {
        assert_eq!(parse_duration_ms("1500").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration_ms("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_ms_invalid() {
        assert!(parse_duration_ms("fast").is_err());
        assert!(parse_duration_ms("-5").is_err());
    }

    #[test]
    fn test_default_staleness_windows() {
        let staleness = StalenessConfig::default();
        assert_eq!(staleness.catalog, Duration::from_secs(5));
        assert!(staleness.categories > staleness.product);
    }

    #[test]
    fn test_for_base_url() {
        let config = ClientConfig::for_base_url(Url::parse("http://localhost:3001").unwrap());
        assert_eq!(config.api_url.as_str(), "http://localhost:3001/");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
