//! Authentication configuration.
//!
//! These types are deserialized from the `[auth]` and `[storage]` sections of
//! the server configuration. Durations use humantime strings (`"60s"`,
//! `"15m"`, `"1d"`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for `authorization_code_lifetime`.
pub const MAX_CODE_LIFETIME: Duration = Duration::from_secs(10 * 60);
/// Upper bound for `access_token_lifetime`.
pub const MAX_ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 3600);
/// Upper bound for `session_lifetime`.
pub const MAX_SESSION_LIFETIME: Duration = Duration::from_secs(365 * 24 * 3600);

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// issuer = "https://sso.example.com"
/// authorization_code_lifetime = "5m"
/// access_token_lifetime = "15m"
///
/// [auth.signing]
/// algorithm = "HS256"
/// secret = "change-me"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Value of the `iss` claim in issued tokens.
    pub issuer: String,

    /// How long an authorization code stays redeemable.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Access token lifetime (`exp - iat`).
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Provider login session lifetime, also the cookie `Max-Age`.
    #[serde(with = "humantime_serde")]
    pub session_lifetime: Duration,

    /// Name of the provider session cookie.
    pub session_cookie_name: String,

    /// Mark cookies `Secure`. Enable whenever the provider is served over TLS.
    pub secure_cookies: bool,

    /// Where unauthenticated users are sent by `/authorize`.
    /// The original authorize query is appended so the flow can resume.
    pub login_page: String,

    /// Attempts made for a store operation that fails with a transient error.
    pub store_retry_attempts: u32,

    /// Initial backoff between store retries; doubles after each attempt.
    #[serde(with = "humantime_serde")]
    pub store_retry_backoff: Duration,

    /// Interval of the expired-entry sweep. Zero disables the sweep.
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,

    /// Token signing configuration.
    pub signing: SigningConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8000".to_string(),
            authorization_code_lifetime: Duration::from_secs(5 * 60),
            access_token_lifetime: Duration::from_secs(15 * 60),
            session_lifetime: Duration::from_secs(24 * 3600),
            session_cookie_name: "sso_session_token".to_string(),
            secure_cookies: false,
            login_page: "/login".to_string(),
            store_retry_attempts: 3,
            store_retry_backoff: Duration::from_millis(50),
            cleanup_interval: Duration::from_secs(5 * 60),
            signing: SigningConfig::default(),
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    /// Supported: "HS256", "RS256", "RS384"
    pub algorithm: String,

    /// Shared secret for HS256.
    pub secret: Option<String>,

    /// PEM-encoded RSA private key (PKCS#8 or PKCS#1).
    /// When absent for an RSA algorithm a key is generated at startup.
    pub private_key_path: Option<PathBuf>,

    /// Key id published in the token header and the JWKS.
    pub key_id: Option<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "HS256".to_string(),
            secret: None,
            private_key_path: None,
            key_id: None,
        }
    }
}

/// Which store backs sessions and authorization codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps. Single instance only.
    #[default]
    Memory,
    /// Shared Redis instance. Required when running several replicas.
    Redis,
}

/// Session and code store configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub redis: RedisConfig,
}

/// Redis connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,

    /// Connection pool size
    pub pool_size: usize,

    /// Pool wait/create/recycle timeout in milliseconds
    pub timeout_ms: u64,

    /// Prefix for every key written by Passgate
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            timeout_ms: 5000,
            key_prefix: "passgate".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer is empty
    /// - Any lifetime is zero
    /// - The signing algorithm is not supported
    /// - HS256 is selected without a secret
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        for (name, value, max) in [
            (
                "authorization_code_lifetime",
                self.authorization_code_lifetime,
                MAX_CODE_LIFETIME,
            ),
            (
                "access_token_lifetime",
                self.access_token_lifetime,
                MAX_ACCESS_TOKEN_LIFETIME,
            ),
            ("session_lifetime", self.session_lifetime, MAX_SESSION_LIFETIME),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue(format!("{name} must be > 0")));
            }
            if value > max {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be at most {}s",
                    max.as_secs()
                )));
            }
        }

        if self.session_cookie_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "session_cookie_name cannot be empty".to_string(),
            ));
        }

        if self.store_retry_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "store_retry_attempts must be >= 1".to_string(),
            ));
        }

        match self.signing.algorithm.as_str() {
            "HS256" => {
                let has_secret = self
                    .signing
                    .secret
                    .as_deref()
                    .is_some_and(|s| !s.is_empty());
                if !has_secret {
                    return Err(ConfigError::InvalidValue(
                        "signing.secret is required for HS256".to_string(),
                    ));
                }
            }
            "RS256" | "RS384" => {}
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid signing algorithm: '{}'. Must be HS256, RS256, or RS384",
                    other
                )));
            }
        }

        Ok(())
    }
}
