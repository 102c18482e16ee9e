//! Query endpoints
//!
//! `POST /invocations` and `POST /api/v1/query` accept the same body and
//! answer with the response envelope.

use super::error::ApiError;
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::Extension;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use switchyard_core::{Error, Inbound, ResponseEnvelope};
use tracing::error;

/// Run the supervisor for one inbound payload in its own task
///
/// A panic inside the supervisor becomes [`ApiError::Fault`] and bumps the
/// fault counter instead of tearing down the connection.
pub async fn supervise(state: &AppState, inbound: Inbound) -> Result<ResponseEnvelope, ApiError> {
    let supervisor = state.supervisor.clone();
    let task = tokio::spawn(async move { supervisor.handle_inbound(inbound).await });

    match task.await {
        Ok(result) => result.map_err(ApiError::from),
        Err(join_error) => {
            state.supervisor.metrics().record_fault();
            error!(
                panicked = join_error.is_panic(),
                faults = state.supervisor.metrics().fault_count(),
                "Supervisor task failed"
            );
            Err(ApiError::Fault)
        }
    }
}

async fn invoke(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::Core(Error::invalid("malformed_json")))?;

    let envelope = supervise(&state, Inbound::Api(payload)).await?;
    Ok(Json(envelope))
}

/// Query routes
pub fn invocations_routes() -> Router {
    Router::new()
        .route("/invocations", post(invoke))
        .route("/api/v1/query", post(invoke))
}
