//! Session endpoints: login, refresh, logout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::auth::{AuthError, IssuedToken, TokenRejection, clear_session_cookie, session_cookie};

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned alongside a fresh session cookie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub expires_at: DateTime<Utc>,
}

fn with_session_cookie(state: &AppState, issued: IssuedToken) -> Response {
    let cookie = session_cookie(state.gate.cookie_name(), &issued, state.secure_cookie);
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(SessionResponse {
            expires_at: issued.expires_at,
        }),
    )
        .into_response()
}

/// Login endpoint.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Unreadable login payload");
        AuthError::InvalidCredentialsFormat
    })?;

    let issued = state
        .sessions
        .login(request.email.trim(), &request.password)
        .await?;

    Ok(with_session_cookie(&state, issued))
}

/// Exchange a near-expiry session cookie for a fresh one.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let token = state
        .gate
        .session_token(&headers)
        .ok_or(AuthError::Unauthenticated(TokenRejection::Missing))?;

    let issued = state.sessions.renew(token).await?;

    Ok(with_session_cookie(&state, issued))
}

/// Logout endpoint (clears the session cookie).
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = clear_session_cookie(state.gate.cookie_name(), state.secure_cookie);
    (StatusCode::NO_CONTENT, AppendHeaders([(SET_COOKIE, cookie)]))
}
