//! Agent transport
//!
//! The transport only moves JSON; timeouts, retries and breaker bookkeeping
//! belong to the invoker.

use super::FailureKind;
use crate::error::{Error, Result};
use crate::registry::AgentDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Failure of a single call to an agent
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Per-call timeout elapsed
    #[error("timed out")]
    Timeout,
    /// Could not reach the agent
    #[error("transport error: {0}")]
    Transport(String),
    /// Agent answered with a non-2xx status
    #[error("agent returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },
    /// 2xx response with a body that is not JSON
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether repeating the same request could succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::Decode(_) => false,
        }
    }

    /// Failure classification, `None` for timeouts
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Timeout => None,
            Self::Transport(_) => Some(FailureKind::Transport),
            Self::Status { status, .. } if (400..500).contains(status) && !self.is_retryable() => {
                Some(FailureKind::Rejected)
            }
            Self::Status { .. } => Some(FailureKind::Server),
            Self::Decode(_) => Some(FailureKind::Decode),
        }
    }
}

/// Sends a request body to an agent and returns the decoded JSON reply
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// POST `body` to the agent's endpoint
    async fn send(
        &self,
        agent: &AgentDescriptor,
        body: &Value,
    ) -> std::result::Result<Value, TransportError>;
}

const MAX_ERROR_BODY: usize = 512;

/// HTTP transport over a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the given connect timeout
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("switchyard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Configuration(format!("agent http client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn send(
        &self,
        agent: &AgentDescriptor,
        body: &Value,
    ) -> std::result::Result<Value, TransportError> {
        let response = self
            .client
            .post(&agent.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
