//! Health and metrics endpoint handlers

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use super::AppState;
use crate::metrics::Readiness;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Liveness probe: the process is up, nothing else is checked
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe
///
/// Ready while no poll has succeeded yet, or while the last success is
/// fresher than two poll intervals and the circuit breaker is closed.
pub async fn readiness(State(state): State<AppState>) -> Response {
    match state
        .metrics
        .readiness(state.config.poll_interval(), Instant::now())
    {
        Readiness::Ready => (StatusCode::OK, "READY").into_response(),
        Readiness::NotReady {
            since_secs,
            failures,
        } => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("NOT READY: Last success {since_secs}s ago, failures: {failures}"),
        )
            .into_response(),
    }
}

/// Prometheus scrape endpoint
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Error generating metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error generating metrics").into_response()
        }
    }
}

/// Catch-all for unknown paths
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
