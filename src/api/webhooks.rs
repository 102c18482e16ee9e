//! Webhook handlers for chat platforms
//!
//! Slack expects an acknowledgement within 3 seconds. The supervisor runs in
//! a background task; the handler waits at most the configured ack budget and
//! then answers 200 whether or not the answer is ready. The answer, or a
//! failure notice, is posted into the thread once it exists.

use super::error::ApiError;
use super::invocations::supervise;
use crate::server::AppState;
use axum::body::Bytes;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use switchyard_channels::slack::api::RETRY_HEADER;
use switchyard_channels::{SlackAdapter, SlackPayload};
use switchyard_core::{ChatMessage, Error, Inbound, ResponseEnvelope};
use tracing::{debug, info, warn};

/// Text posted back when no answer could be produced
pub fn failure_notice(result: &Result<ResponseEnvelope, ApiError>) -> Option<String> {
    match result {
        Ok(_) => None,
        Err(ApiError::Core(Error::NoAgentAvailable)) => Some(
            "No agent is available to answer right now. Please try again in a moment.".to_string(),
        ),
        Err(ApiError::Core(Error::AllAgentsFailed { attempts, .. })) => Some(format!(
            "Sorry, I couldn't get an answer. {} agent attempt(s) failed.",
            attempts.len()
        )),
        Err(_) => Some("Sorry, something went wrong while answering.".to_string()),
    }
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

async fn answer_in_thread(state: AppState, adapter: Arc<SlackAdapter>, message: ChatMessage) {
    let _guard = state.shutdown.register_task();
    let channel = message.conversation.clone();
    let thread = message.thread.clone();

    let result = supervise(&state, Inbound::Chat(message)).await;
    let text = match &result {
        Ok(envelope) => envelope.answer_text(),
        Err(ApiError::Core(Error::InvalidRequest { reason })) => {
            debug!(reason = %reason, "Slack message rejected, not replying");
            return;
        }
        Err(_) => failure_notice(&result).unwrap_or_default(),
    };

    match adapter.post_message(&channel, &thread, &text).await {
        Ok(ts) => info!(channel = %channel, thread = %thread, ts = %ts, "Answer posted to Slack"),
        Err(e) => warn!(channel = %channel, error = %e, "Failed to post answer to Slack"),
    }
}

async fn slack_webhook(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(adapter) = state.slack.clone() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let Ok(body) = std::str::from_utf8(&body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if let Err(e) = adapter.verify_webhook_request(&header_pairs(&headers), body) {
        warn!(error = %e, "Rejected Slack webhook");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    // Slack redelivers when we were slow; the first delivery is already being answered
    if headers.contains_key(RETRY_HEADER) {
        debug!("Ignoring Slack retry delivery");
        return StatusCode::OK.into_response();
    }

    let payload = match adapter.parse_event(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed Slack event");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match payload {
        SlackPayload::UrlVerification { challenge } => {
            info!("Slack URL verification");
            Json(json!({"challenge": challenge})).into_response()
        }
        SlackPayload::Ignored(reason) => {
            debug!(reason, "Slack event ignored");
            StatusCode::OK.into_response()
        }
        SlackPayload::Message(message) => {
            let budget = adapter.config().ack_budget;
            let mut task = tokio::spawn(answer_in_thread(state, adapter, message));

            if tokio::time::timeout(budget, &mut task).await.is_err() {
                debug!(budget_ms = budget.as_millis() as u64, "Acknowledging before the answer is ready");
            }
            StatusCode::OK.into_response()
        }
    }
}

/// Create webhook routes
pub fn webhooks_routes() -> Router {
    Router::new().route("/api/v1/webhooks/slack", post(slack_webhook))
}
