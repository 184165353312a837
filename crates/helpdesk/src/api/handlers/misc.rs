//! Health and clock endpoints.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
pub struct TimeResponse {
    pub now: DateTime<Utc>,
}

/// Server clock, for clients scheduling token renewal.
pub async fn time() -> Json<TimeResponse> {
    Json(TimeResponse { now: Utc::now() })
}
