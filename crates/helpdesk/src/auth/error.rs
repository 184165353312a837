//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use super::TokenError;

/// Why the Auth Gate turned a request away.
///
/// Only this coarse reason reaches the client; signature and algorithm
/// details stay in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Missing,
    Invalid,
    Expired,
}

impl TokenRejection {
    fn message(self) -> &'static str {
        match self {
            TokenRejection::Missing => "Token missing in 'Cookie' headers.",
            TokenRejection::Invalid => "Token invalid.",
            TokenRejection::Expired => "Token expired.",
        }
    }

    fn code(self) -> &'static str {
        match self {
            TokenRejection::Missing => "token_missing",
            TokenRejection::Invalid => "token_invalid",
            TokenRejection::Expired => "token_expired",
        }
    }
}

impl From<&TokenError> for TokenRejection {
    fn from(err: &TokenError) -> Self {
        match err {
            TokenError::Expired(_) => TokenRejection::Expired,
            _ => TokenRejection::Invalid,
        }
    }
}

/// What failed during an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Login lookup found no user for the email/password pair.
    UnknownCredentials,
    /// Renewal was attempted with a token that does not verify.
    InvalidToken,
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login payload is not a valid email/non-empty password pair.
    #[error("valid email address and password required")]
    InvalidCredentialsFormat,

    /// Login or renewal failed to authenticate.
    #[error("authentication failed")]
    AuthenticationFailed(AuthFailure),

    /// Renewal attempted while the token still has plenty of life.
    #[error("token can only be renewed within {threshold_secs} seconds of expiry")]
    RenewalTooEarly { threshold_secs: i64 },

    /// The Auth Gate rejected the request.
    #[error("unauthenticated: {0:?}")]
    Unauthenticated(TokenRejection),

    /// Token signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Internal error.
    #[error("internal auth error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub code: String,
}

impl AuthError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentialsFormat => StatusCode::BAD_REQUEST,
            AuthError::AuthenticationFailed(AuthFailure::UnknownCredentials) => {
                StatusCode::NOT_FOUND
            }
            AuthError::AuthenticationFailed(AuthFailure::InvalidToken) => StatusCode::UNAUTHORIZED,
            AuthError::RenewalTooEarly { .. } => StatusCode::BAD_REQUEST,
            AuthError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AuthError::Signing(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentialsFormat => "invalid_credentials_format",
            AuthError::AuthenticationFailed(_) => "authentication_failed",
            AuthError::RenewalTooEarly { .. } => "renewal_too_early",
            AuthError::Unauthenticated(reason) => reason.code(),
            AuthError::Signing(_) | AuthError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to the client.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidCredentialsFormat => {
                "Valid email address and password required.".to_string()
            }
            AuthError::AuthenticationFailed(AuthFailure::UnknownCredentials) => {
                "User with specified credentials not found.".to_string()
            }
            AuthError::AuthenticationFailed(AuthFailure::InvalidToken) => {
                TokenRejection::Invalid.message().to_string()
            }
            AuthError::RenewalTooEarly { threshold_secs } => format!(
                "Token can only be refreshed during the last {} seconds of its lifetime.",
                threshold_secs
            ),
            AuthError::Unauthenticated(reason) => reason.message().to_string(),
            AuthError::Signing(_) | AuthError::Internal(_) => {
                "Please try again later.".to_string()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Signing(msg) | AuthError::Internal(msg) = &self {
            error!(error_code = self.error_code(), message = %msg, "Auth error");
        }

        let body = Json(AuthErrorResponse {
            error: self.public_message(),
            code: self.error_code().to_string(),
        });

        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = AuthError::InvalidCredentialsFormat;
        assert_eq!(err.to_string(), "valid email address and password required");

        let err = AuthError::RenewalTooEarly { threshold_secs: 60 };
        assert_eq!(
            err.to_string(),
            "token can only be renewed within 60 seconds of expiry"
        );
    }

    #[test]
    fn test_token_errors_collapse_to_coarse_rejections() {
        let expired = TokenError::Expired(Box::new(crate::auth::SessionClaims {
            identity: crate::auth::Identity {
                username: "a".to_string(),
                email: "a@example.com".to_string(),
                is_staff: false,
                is_superuser: false,
            },
            exp: 0,
        }));

        assert_eq!(TokenRejection::from(&expired), TokenRejection::Expired);
        for err in [
            TokenError::Malformed,
            TokenError::WrongAlgorithm,
            TokenError::BadSignature,
        ] {
            assert_eq!(TokenRejection::from(&err), TokenRejection::Invalid);
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::InvalidCredentialsFormat.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::AuthenticationFailed(AuthFailure::UnknownCredentials).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::AuthenticationFailed(AuthFailure::InvalidToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::RenewalTooEarly { threshold_secs: 60 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Unauthenticated(TokenRejection::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Signing("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AuthError::Internal("database is locked".to_string());
        assert_eq!(err.public_message(), "Please try again later.");
    }
}
