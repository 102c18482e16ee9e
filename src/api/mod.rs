//! Web API module for Switchyard
//!
//! Provides REST API endpoints for:
//! - Query invocation
//! - Liveness, health and metrics
//! - Registry inspection
//! - Chat platform webhooks

pub mod agents;
pub mod error;
pub mod health;
pub mod invocations;
pub mod webhooks;

use crate::server::AppState;
use axum::{Extension, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use agents::agents_routes;
pub use health::health_routes;
pub use invocations::invocations_routes;
pub use webhooks::webhooks_routes;

/// Create the full application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(invocations_routes())
        .merge(health_routes())
        .merge(agents_routes())
        .merge(webhooks_routes())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests;
