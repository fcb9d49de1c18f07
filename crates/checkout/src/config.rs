//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `DELIVERY_API_BASE_URL` - Base URL of the delivery REST API. Without it the
//!   session runs offline: no saved address lookup and no address saving.
//! - `DELIVERY_API_TOKEN` - Bearer token issued by the auth service
//! - `DELIVERY_USER_ID` - Numeric id of the signed-in user
//! - `DELIVERY_FEE` - Flat delivery fee added to every invoice (default: 5.00)
//! - `DELIVERY_CURRENCY` - ISO 4217 currency code (default: BRL)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::str::FromStr;

use delivery_core::{CurrencyCode, UserId};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Flat delivery fee charged when `DELIVERY_FEE` is not set.
pub const DEFAULT_DELIVERY_FEE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Checkout session configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Delivery REST API settings, when the API is configured
    pub api: Option<ApiConfig>,
    /// Signed-in user, if any
    pub user_id: Option<UserId>,
    /// Flat fee added on the invoice
    pub delivery_fee: Decimal,
    /// Currency used to display amounts
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Delivery REST API configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.example.com/api/`
    pub base_url: Url,
    /// Bearer token supplied by the auth service
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api: None,
            user_id: None,
            delivery_fee: DEFAULT_DELIVERY_FEE,
            currency: CurrencyCode::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or the API token looks
    /// like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`CheckoutConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = ApiConfig::from_lookup(&lookup)?;
        let user_id = parse_optional::<UserId, _>(&lookup, "DELIVERY_USER_ID")?;
        let delivery_fee =
            parse_optional::<Decimal, _>(&lookup, "DELIVERY_FEE")?.unwrap_or(DEFAULT_DELIVERY_FEE);
        let currency =
            parse_optional::<CurrencyCode, _>(&lookup, "DELIVERY_CURRENCY")?.unwrap_or_default();

        Ok(Self {
            api,
            user_id,
            delivery_fee,
            currency,
            sentry_dsn: get_optional(&lookup, "SENTRY_DSN"),
            sentry_environment: get_optional(&lookup, "SENTRY_ENVIRONMENT"),
        })
    }
}

impl ApiConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(raw_url) = get_optional(lookup, "DELIVERY_API_BASE_URL") else {
            return Ok(None);
        };
        let base_url = parse_base_url(&raw_url)?;

        let token = match get_optional(lookup, "DELIVERY_API_TOKEN") {
            Some(value) => {
                validate_token_strength(&value, "DELIVERY_API_TOKEN")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Some(Self { base_url, token }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional, non-blank variable.
fn get_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Parse an optional variable with `FromStr`.
fn parse_optional<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    get_optional(lookup, key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Parse the API base URL, forcing a trailing slash so relative joins keep
/// any path prefix (e.g. `/api/`).
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar("DELIVERY_API_BASE_URL".to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a token is not a placeholder and has sufficient entropy.
fn validate_token_strength(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = token.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(token);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Paste the token issued at login."
            ),
        ));
    }

    Ok(())
}

/// Expose the bearer token for building the `Authorization` header.
pub(crate) fn bearer_value(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}
