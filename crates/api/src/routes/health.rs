//! Health check endpoint handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreHealth,
    pub queue: QueueHealth,
}

/// Key-value store health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreHealth {
    pub backend: String,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Queue consumer status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueHealth {
    pub enabled: bool,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// Returns 503 when the store cannot be reached.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    let start = std::time::Instant::now();
    state.templates.health_check().await.map_err(store_unavailable)?;
    let latency_ms = start.elapsed().as_millis() as u64;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: StoreHealth {
            backend: state.config.store.backend.clone(),
            connected: true,
            latency_ms: Some(latency_ms),
        },
        queue: QueueHealth {
            enabled: state.config.queue.enabled,
        },
    }))
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK if the service can accept traffic (store reachable).
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    state.templates.health_check().await.map_err(store_unavailable)?;

    Ok(Json(StatusResponse {
        status: "ready".to_string(),
    }))
}

fn store_unavailable(err: domain::errors::PersistenceError) -> ApiError {
    ApiError::ServiceUnavailable(format!("Store unreachable: {}", err))
}
