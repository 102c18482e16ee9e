//! Liveness, health and metrics endpoints
//!
//! - `/ping`: empty 200 while healthy, 503 once supervisor faults reach the threshold
//! - `/health`: status + version
//! - `/metrics`: Prometheus text exposition

use crate::server::AppState;
use axum::extract::Extension;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tracing::warn;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn ping(Extension(state): Extension<AppState>) -> StatusCode {
    let faults = state.supervisor.metrics().fault_count();
    if state.fault_threshold > 0 && faults >= state.fault_threshold {
        warn!(faults, threshold = state.fault_threshold, "Reporting unhealthy on /ping");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn metrics(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.export_prometheus(),
    )
}

/// Health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
}
