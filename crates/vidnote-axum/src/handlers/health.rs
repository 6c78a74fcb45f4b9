//! Liveness endpoints.

use axum::Json;

use crate::dto::HealthResponse;

/// `GET /`
pub async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Sidecar is running".to_string(),
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Sidecar is healthy".to_string(),
    })
}
