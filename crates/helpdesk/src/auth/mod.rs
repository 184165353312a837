//! Authentication module.
//!
//! Provides:
//! - Signed session tokens (HS256 JWT) in an HTTP-only cookie
//! - Login and near-expiry renewal
//! - Auth Gate middleware for protected routes

mod claims;
mod codec;
mod config;
mod error;
mod middleware;
mod session;

pub use claims::{Identity, Role, SessionClaims};
pub use codec::{IssuedToken, TokenCodec, TokenError};
pub use config::{AuthConfig, ConfigValidationError, MAX_TOKEN_TTL_SECS, MIN_SECRET_LEN};
pub use error::{AuthError, AuthFailure, TokenRejection};
pub use middleware::{
    AuthGate, CurrentUser, auth_middleware, bearer_token_from_header, token_from_cookie_header,
};
pub use session::{
    CredentialVerifier, SessionIssuer, SessionPolicy, clear_session_cookie, session_cookie,
};
