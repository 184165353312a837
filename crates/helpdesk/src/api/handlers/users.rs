//! Registration and current-user endpoints.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use tracing::warn;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthError, CurrentUser, TokenRejection, bearer_token_from_header};
use crate::user::{CreateUserRequest, UserInfo};

/// Check the staff registration bearer token.
fn authorize_staff_registration(state: &AppState, headers: &HeaderMap) -> Result<(), AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Unauthenticated(TokenRejection::Missing))?;

    let presented = header
        .to_str()
        .ok()
        .and_then(bearer_token_from_header)
        .ok_or(AuthError::Unauthenticated(TokenRejection::Invalid))?;

    match state.staff_token.as_deref() {
        Some(expected) if expected == presented => Ok(()),
        Some(_) => {
            warn!("Staff registration with wrong token");
            Err(AuthError::Unauthenticated(TokenRejection::Invalid))
        }
        None => {
            warn!("Staff registration attempted but no staff token is configured");
            Err(AuthError::Unauthenticated(TokenRejection::Invalid))
        }
    }
}

/// Register a new user.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    if request.is_staff {
        authorize_staff_registration(&state, &headers)?;
    }

    let user = state.users.create_user(request).await?;

    Ok((StatusCode::CREATED, Json(UserInfo::from(user.identity()))))
}

/// Identity of the caller.
pub async fn me(user: CurrentUser) -> Json<UserInfo> {
    Json(UserInfo::from(user.0))
}
