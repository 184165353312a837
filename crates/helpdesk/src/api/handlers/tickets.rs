//! Ticket endpoints. All of them sit behind the Auth Gate.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::CurrentUser;
use crate::ticket::{
    CreateMessageRequest, CreateTicketRequest, Message, Ticket, UpdateStatusRequest,
};

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

fn read_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// List tickets visible to the caller.
pub async fn list_tickets(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list(&user).await?))
}

/// Open a ticket.
pub async fn create_ticket(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = read_body(payload)?;
    let ticket = state.tickets.create(&user, request).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: ticket.id })))
}

/// Get one ticket.
pub async fn get_ticket(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(state.tickets.get(&user, id).await?))
}

/// Change a ticket's status.
pub async fn update_ticket_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Ticket>> {
    let request = read_body(payload)?;
    Ok(Json(
        state
            .tickets
            .update_status(&user, id, &request.status)
            .await?,
    ))
}

/// Messages of a ticket.
pub async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(state.tickets.messages(&user, id).await?))
}

/// Post a message to a ticket.
pub async fn create_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = read_body(payload)?;
    let message = state.tickets.add_message(&user, id, &request.text).await?;

    Ok((StatusCode::CREATED, Json(message)))
}
