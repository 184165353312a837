//! Login and token renewal.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use super::{AuthError, AuthFailure, Identity, IssuedToken, TokenCodec, TokenError};
use crate::user::is_valid_email;

/// Looks up an identity by email/password.
///
/// Returns `Ok(None)` for unknown users and wrong passwords alike.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> anyhow::Result<Option<Identity>>;
}

/// Session lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Lifetime of a freshly issued token.
    pub ttl: Duration,
    /// Renewal is refused while more than this much lifetime remains.
    pub renewal_threshold: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
            renewal_threshold: Duration::minutes(1),
        }
    }
}

/// Issues session tokens on login and renews them near expiry.
#[derive(Clone)]
pub struct SessionIssuer {
    codec: TokenCodec,
    verifier: Arc<dyn CredentialVerifier>,
    policy: SessionPolicy,
}

impl SessionIssuer {
    pub fn new(
        codec: TokenCodec,
        verifier: Arc<dyn CredentialVerifier>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            codec,
            verifier,
            policy,
        }
    }

    /// Verify credentials and mint a session token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        if !is_valid_email(email) || password.is_empty() {
            return Err(AuthError::InvalidCredentialsFormat);
        }

        let identity = self
            .verifier
            .verify(email, password)
            .await
            .map_err(|e| AuthError::Internal(format!("{:#}", e)))?
            .ok_or(AuthError::AuthenticationFailed(AuthFailure::UnknownCredentials))?;

        let issued = self.issue(&identity)?;
        info!(email = %identity.email, role = %identity.role(), "Session issued");
        Ok(issued)
    }

    /// Exchange a token that is close to (or past) its expiry for a fresh one
    /// carrying the same identity.
    #[instrument(skip_all)]
    pub async fn renew(&self, token: &str) -> Result<IssuedToken, AuthError> {
        self.renew_at(token, Utc::now())
    }

    /// Renewal with an explicit clock.
    fn renew_at(&self, token: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let claims = match self.codec.decode(token) {
            Ok(claims) => claims,
            Err(TokenError::Expired(claims)) => *claims,
            Err(e) => {
                warn!(error = %e, "Renewal with unverifiable token");
                return Err(AuthError::AuthenticationFailed(AuthFailure::InvalidToken));
            }
        };

        let remaining = claims.expires_at() - now;
        if remaining > self.policy.renewal_threshold {
            debug!(remaining_secs = remaining.num_seconds(), "Renewal too early");
            return Err(AuthError::RenewalTooEarly {
                threshold_secs: self.policy.renewal_threshold.num_seconds(),
            });
        }

        let issued = self.issue(&claims.identity)?;
        info!(email = %claims.identity.email, "Session renewed");
        Ok(issued)
    }

    fn issue(&self, identity: &Identity) -> Result<IssuedToken, AuthError> {
        self.codec
            .issue(identity, self.policy.ttl)
            .map_err(|e| match e {
                TokenError::Signing(msg) => AuthError::Signing(msg),
                other => AuthError::Internal(other.to_string()),
            })
    }
}

/// `Set-Cookie` value carrying `issued` with a matching expiry.
pub fn session_cookie(name: &str, issued: &IssuedToken, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Expires={}",
        name,
        issued.token,
        issued.expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
