//! Health and liveness handlers

use axum::Json;
use chrono::Utc;

use crate::dto::ServerTimeResponse;

/// Ping endpoint
#[utoipa::path(
    get,
    path = "/api/v1/ping",
    tag = "General",
    responses(
        (status = 200, description = "Pong")
    )
)]
pub async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({}))
}

/// Server time endpoint
#[utoipa::path(
    get,
    path = "/api/v1/time",
    tag = "General",
    responses(
        (status = 200, description = "Server time", body = ServerTimeResponse)
    )
)]
pub async fn server_time() -> Json<ServerTimeResponse> {
    Json(ServerTimeResponse {
        server_time: Utc::now().timestamp_millis(),
    })
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "General",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
