//! Authentication configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::SessionPolicy;

/// Minimum accepted length for the signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session token lifetime (one day).
pub const MAX_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Supports `env:VAR_NAME`.
    pub jwt_secret: Option<String>,

    /// Lifetime of an issued session token, in seconds.
    pub token_ttl_secs: i64,

    /// A token may be renewed only when it has at most this many seconds left.
    pub renewal_threshold_secs: i64,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Mark the session cookie `Secure`.
    pub secure_cookie: bool,

    /// Bearer token required to register staff accounts. Supports `env:VAR_NAME`.
    /// Staff registration over HTTP is disabled when unset.
    pub staff_token: Option<String>,

    /// Allowed CORS origins. If empty, CORS is disabled.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // No default secret, must be explicitly configured
            jwt_secret: None,
            token_ttl_secs: 300,
            renewal_threshold_secs: 60,
            cookie_name: "token".to_string(),
            secure_cookie: false,
            staff_token: None,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8080".to_string(),
            ],
        }
    }
}

/// Expand `env:VAR_NAME` references.
fn resolve_reference(value: &Option<String>) -> Result<Option<String>, ConfigValidationError> {
    match value {
        None => Ok(None),
        Some(value) => {
            if let Some(var_name) = value.strip_prefix("env:") {
                match std::env::var(var_name) {
                    Ok(resolved) if !resolved.is_empty() => Ok(Some(resolved)),
                    Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                    Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                }
            } else {
                Ok(Some(value.clone()))
            }
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    /// Returns the resolved secret or None if not configured.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        resolve_reference(&self.jwt_secret)
    }

    /// Resolve the staff registration token, expanding `env:VAR_NAME` syntax.
    pub fn resolve_staff_token(&self) -> Result<Option<String>, ConfigValidationError> {
        Ok(resolve_reference(&self.staff_token)?.filter(|token| !token.is_empty()))
    }

    /// Resolve and check the signing secret.
    pub fn signing_secret(&self) -> Result<String, ConfigValidationError> {
        let secret = self
            .resolve_jwt_secret()?
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigValidationError::MissingJwtSecret)?;

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigValidationError::JwtSecretTooShort);
        }

        Ok(secret)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.signing_secret()?;
        self.resolve_staff_token()?;

        if self.token_ttl_secs <= 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigValidationError::InvalidTtl(self.token_ttl_secs));
        }
        if self.renewal_threshold_secs < 0 || self.renewal_threshold_secs >= self.token_ttl_secs {
            return Err(ConfigValidationError::InvalidRenewalThreshold {
                threshold: self.renewal_threshold_secs,
                ttl: self.token_ttl_secs,
            });
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyCookieName);
        }

        Ok(())
    }

    /// Session lifetimes as durations.
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            ttl: Duration::seconds(self.token_ttl_secs),
            renewal_threshold: Duration::seconds(self.renewal_threshold_secs),
        }
    }

    /// Generate a secure random JWT secret.
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// No signing secret configured.
    MissingJwtSecret,
    /// Signing secret is shorter than [`MIN_SECRET_LEN`].
    JwtSecretTooShort,
    /// Environment variable not found (for `env:VAR_NAME` syntax).
    EnvVarNotFound(String),
    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    EnvVarEmpty(String),
    /// Token TTL is not positive or exceeds [`MAX_TOKEN_TTL_SECS`].
    InvalidTtl(i64),
    /// Renewal threshold is negative or not below the TTL.
    InvalidRenewalThreshold { threshold: i64, ttl: i64 },
    /// Cookie name is blank.
    EmptyCookieName,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJwtSecret => {
                write!(
                    f,
                    "JWT secret is required. Set HELPDESK_AUTH__JWT_SECRET or auth.jwt_secret in config (run `helpdesk init` to generate one)."
                )
            }
            Self::JwtSecretTooShort => {
                write!(
                    f,
                    "JWT secret must be at least {} characters long.",
                    MIN_SECRET_LEN
                )
            }
            Self::EnvVarNotFound(var) => {
                write!(
                    f,
                    "Environment variable '{}' not found (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::EnvVarEmpty(var) => {
                write!(
                    f,
                    "Environment variable '{}' is empty (referenced via env:{} in config).",
                    var, var
                )
            }
            Self::InvalidTtl(ttl) => {
                write!(
                    f,
                    "auth.token_ttl_secs must be between 1 and {} (got {}).",
                    MAX_TOKEN_TTL_SECS, ttl
                )
            }
            Self::InvalidRenewalThreshold { threshold, ttl } => {
                write!(
                    f,
                    "auth.renewal_threshold_secs must be between 0 and token_ttl_secs ({}), got {}.",
                    ttl, threshold
                )
            }
            Self::EmptyCookieName => write!(f, "auth.cookie_name must not be empty."),
        }
    }
}

impl std::error::Error for ConfigValidationError {}
