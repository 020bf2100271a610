//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PRODUCT_API_URL` - Base URL of the product REST API (e.g., `https://api.example.com/`)
//!
//! ## Optional
//! - `CONSOLE_HOST` - Bind address (default: 127.0.0.1)
//! - `CONSOLE_PORT` - Listen port (default: 4200)
//! - `CONSOLE_TOKEN_PATH` - File holding the persisted bearer token (default: `.catalog-console/token`)
//! - `CONSOLE_PAGE_SIZE` - Rows per product table page (default: 10)
//! - `PRODUCT_API_TIMEOUT_SECS` - Product API request timeout (default: 30)
//! - `CONSOLE_LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4200;
const DEFAULT_TOKEN_PATH: &str = ".catalog-console/token";
const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Console application configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Product API settings
    pub api: ProductApiConfig,
    /// Where the bearer token is persisted between runs
    pub token_path: PathBuf,
    /// Rows per product table page
    pub page_size: usize,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry error tracking (optional)
    pub sentry: Option<SentryConfig>,
}

/// Remote product API configuration.
#[derive(Debug, Clone)]
pub struct ProductApiConfig {
    /// Base URL; `products` is resolved against it.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Sentry configuration.
///
/// Implements `Debug` manually to redact the DSN.
#[derive(Clone)]
pub struct SentryConfig {
    pub dsn: SecretString,
    /// Sentry environment (e.g., "development", "production")
    pub environment: Option<String>,
    /// Error sample rate (0.0 to 1.0)
    pub sample_rate: f32,
    /// Traces sample rate (0.0 to 1.0)
    pub traces_sample_rate: f32,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("dsn", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("sample_rate", &self.sample_rate)
            .field("traces_sample_rate", &self.traces_sample_rate)
            .finish()
    }
}

impl SentryConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(dsn) = get_optional_env("SENTRY_DSN") else {
            return Ok(None);
        };

        Ok(Some(Self {
            dsn: SecretString::from(dsn),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: parse_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        }))
    }

    /// DSN for `sentry::init`.
    #[must_use]
    pub fn dsn(&self) -> &str {
        self.dsn.expose_secret()
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads a `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = get_env_or_default("CONSOLE_HOST", DEFAULT_HOST)
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidEnvVar("CONSOLE_HOST".to_string(), e.to_string())
            })?;

        let port = parse_env("CONSOLE_PORT", DEFAULT_PORT)?;
        let page_size = parse_env("CONSOLE_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CONSOLE_PAGE_SIZE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let log_format = match get_optional_env("CONSOLE_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            host,
            port,
            api: ProductApiConfig::from_env()?,
            token_path: PathBuf::from(get_env_or_default("CONSOLE_TOKEN_PATH", DEFAULT_TOKEN_PATH)),
            page_size,
            log_format,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Get the socket address to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ProductApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_required_env("PRODUCT_API_URL")?)?;
        let timeout_secs = parse_env("PRODUCT_API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS)?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// the full path (`https://host/v1` + `products` → `https://host/v1/products`).
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the URL is malformed or not http(s).
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("PRODUCT_API_URL".to_string(), msg);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let rate = parse_env(key, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ))
    }
}
