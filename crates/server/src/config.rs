//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MEALMIND_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SUPABASE_URL` - Supabase project URL (e.g., <https://abc.supabase.co>)
//! - `SUPABASE_ANON_KEY` - Supabase anonymous (public) API key
//! - `GEMINI_API_KEY` - Google Gemini API key (high entropy)
//!
//! ## Optional
//! - `MEALMIND_HOST` - Bind address (default: 127.0.0.1)
//! - `MEALMIND_PORT` - Listen port (default: 3000)
//! - `MEALMIND_BASE_URL` - Public URL (default: `http://{host}:{port}`)
//! - `MEALMIND_FREE_GENERATIONS` - Free recipe generations per user (default: 5)
//! - `GEMINI_MODEL` - Gemini model name (default: gemini-1.5-flash)
//! - `PAYPAL_CLIENT_ID` - PayPal client id handed to the browser checkout
//! - `PAYPAL_PLAN_ID` - PayPal subscription plan id
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Default number of free generations before the paywall applies.
pub const DEFAULT_FREE_GENERATIONS: u32 = 5;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
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
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct MealMindConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Supabase identity configuration
    pub supabase: SupabaseConfig,
    /// Gemini generation configuration
    pub gemini: GeminiConfig,
    /// PayPal checkout configuration (public values only)
    pub paypal: PayPalConfig,
    /// Free generations per user before a subscription is required
    pub free_generation_limit: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Supabase project settings.
///
/// The anon key is public (it is also served to the browser), so
/// it is not held as a secret.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash
    pub url: String,
    /// Anonymous API key
    pub anon_key: String,
}

/// Gemini API settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent as the `key` query parameter
    pub api_key: SecretString,
    /// Model name (e.g., gemini-1.5-flash)
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// PayPal checkout settings exposed to the browser.
#[derive(Debug, Clone, Default)]
pub struct PayPalConfig {
    pub client_id: Option<String>,
    pub plan_id: Option<String>,
}

impl MealMindConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MEALMIND_DATABASE_URL")?;
        let host = parse_env("MEALMIND_HOST", "127.0.0.1")?;
        let port = parse_env("MEALMIND_PORT", "3000")?;
        let base_url = get_optional_env("MEALMIND_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        let free_generation_limit =
            parse_env("MEALMIND_FREE_GENERATIONS", &DEFAULT_FREE_GENERATIONS.to_string())?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            supabase: SupabaseConfig::from_env()?,
            gemini: GeminiConfig::from_env()?,
            paypal: PayPalConfig::from_env(),
            free_generation_limit,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SupabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("SUPABASE_URL")?;
        let parsed = url::Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "SUPABASE_URL".to_string(),
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        Ok(Self {
            url: raw.trim_end_matches('/').to_string(),
            anon_key: get_required_env("SUPABASE_ANON_KEY")?,
        })
    }
}

impl GeminiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_validated_secret("GEMINI_API_KEY")?,
            model: get_env_or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
        })
    }
}

impl PayPalConfig {
    fn from_env() -> Self {
        Self {
            client_id: get_optional_env("PAYPAL_CLIENT_ID"),
            plan_id: get_optional_env("PAYPAL_PLAN_ID"),
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

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
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

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_config() -> MealMindConfig {
        MealMindConfig {
            database_url: SecretString::from("postgres://localhost/mealmind"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            supabase: SupabaseConfig {
                url: "https://abc.supabase.co".to_string(),
                anon_key: "anon".to_string(),
            },
            gemini: GeminiConfig {
                api_key: SecretString::from("AIzaQk3vT9pLm2Xr7bN4cW8eHs1uYd6fGj0oZ"),
                model: DEFAULT_GEMINI_MODEL.to_string(),
            },
            paypal: PayPalConfig::default(),
            free_generation_limit: DEFAULT_FREE_GENERATIONS,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-gemini-key-here", "GEMINI_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "GEMINI_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("AIzaQk3vT9pLm2Xr7bN4cW8eHs1uYd6fGj0oZ", "GEMINI_API_KEY");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = sample_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_gemini_config_debug_redacts_key() {
        let debug_output = format!("{:?}", sample_config().gemini);
        assert!(debug_output.contains("gemini-1.5-flash"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaQk3v"));
    }

    #[test]
    fn test_parse_env_reports_key() {
        let err = parse_env::<u16>("MEALMIND_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "MEALMIND_TEST_UNSET_PORT"));
    }
}
