//! Authentication middleware.

use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::COOKIE, request::Parts},
    middleware::{self, Next},
    response::Response,
};
use tracing::debug;

use super::{AuthError, Identity, TokenCodec, TokenRejection};

/// Extract a Bearer token from an Authorization header value.
pub fn bearer_token_from_header(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next()?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    Some(token)
}

/// Find a cookie value by name in a `Cookie` header.
pub fn token_from_cookie_header<'a>(cookie_header: &'a str, cookie_name: &str) -> Option<&'a str> {
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() == cookie_name {
            Some(value.trim())
        } else {
            None
        }
    })
}

/// Guards protected routes with the session cookie.
#[derive(Clone, Debug)]
pub struct AuthGate {
    codec: TokenCodec,
    cookie_name: String,
}

impl AuthGate {
    pub fn new(codec: TokenCodec, cookie_name: impl Into<String>) -> Self {
        Self {
            codec,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Session token carried by the request, if any.
    pub fn session_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .find_map(|cookie_header| token_from_cookie_header(cookie_header, &self.cookie_name))
            .filter(|token| !token.is_empty())
    }

    /// Resolve the identity carried by the request's session cookie.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = self
            .session_token(headers)
            .ok_or(AuthError::Unauthenticated(TokenRejection::Missing))?;

        self.codec
            .decode(token)
            .map(|claims| claims.identity)
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                AuthError::Unauthenticated(TokenRejection::from(&e))
            })
    }

    /// Put every route of `router` behind the gate.
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(
            self.clone(),
            auth_middleware,
        ))
    }
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl std::ops::Deref for CurrentUser {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::Unauthenticated(TokenRejection::Missing))
    }
}

/// Authentication middleware.
///
/// Verifies the session cookie and injects `CurrentUser` into request extensions.
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = gate.authenticate(req.headers())?;
    req.extensions_mut().insert(CurrentUser(identity));

    Ok(next.run(req).await)
}
