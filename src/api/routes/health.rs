//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 once the index store is reachable. Individual files may
/// still be indexing; that is reported per file by the list endpoint.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    // A successful listing means the store is up, even when it is empty.
    let _ = state.index.list_files().await;
    StatusCode::OK
}

/// GET /health
///
/// Full health status with tracked-file count and uptime.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let tracked_files = state.index.list_files().await.len();

    Json(HealthResponse {
        status: "healthy".to_string(),
        tracked_files,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
