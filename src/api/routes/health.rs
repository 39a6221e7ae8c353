//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (country directory loaded)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Ready once the country directory has been loaded; nothing can be
/// selected before that.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.controller.snapshot().directory.is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.controller.snapshot();
    let directory_ok = !snapshot.directory.is_empty();

    let status = match (directory_ok, snapshot.last_error.is_some()) {
        (true, false) => "healthy",
        (true, true) => "degraded",
        (false, _) => "unhealthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        directory: if directory_ok { "ok" } else { "empty" }.to_string(),
        pending_fetches: snapshot.pending.len(),
        ws_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
