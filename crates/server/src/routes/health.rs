use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Pins the uptime origin; called once the server starts.
pub fn mark_started() {
    once_cell::sync::Lazy::force(&SERVER_START_TIME);
}

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "helios-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness check endpoint
///
/// State is only built once the embedder exists (and is warmed up when
/// configured), so reaching this handler means requests can be served.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let thresholds = state.analyzer.thresholds();
    Json(json!({
        "status": "ready",
        "service": "helios-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
        "embedding": {
            "mode": state.backend(),
            "model": state.model_name(),
        },
        "thresholds": {
            "too_similar": thresholds.too_similar,
            "borderline": thresholds.borderline,
        },
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    if !state.config.metrics_enabled {
        return Err(ServerError::NotFound);
    }
    let body = state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
