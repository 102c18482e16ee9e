//! Request-level error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use switchyard_core::Error;
use tracing::error;

/// Error returned by the query endpoints
#[derive(Debug)]
pub enum ApiError {
    /// Supervisor returned a request-level error
    Core(Error),
    /// Supervisor task panicked or was cancelled
    Fault,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Core(Error::InvalidRequest { reason }) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "invalid_request", "reason": reason}),
            ),
            Self::Core(Error::NoAgentAvailable) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"error": "no_agent_available", "attempts": []}),
            ),
            Self::Core(Error::AllAgentsFailed {
                session_id,
                attempts,
            }) => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": "all_agents_failed",
                    "session_id": session_id,
                    "attempts": attempts,
                }),
            ),
            Self::Core(other) => {
                error!(error = %other, "Unexpected supervisor error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "internal"}))
            }
            Self::Fault => (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "internal"})),
        };

        (status, Json(body)).into_response()
    }
}
