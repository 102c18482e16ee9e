//! Error types for switchyard-core
//!
//! Request-level failures carry the `attempts` trail so the caller can see
//! what was tried even when no agent produced an answer.

use crate::supervisor::AttemptRecord;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or empty input, rejected before any backend call
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Machine-readable reason (e.g. `empty_text`)
        reason: String,
    },

    /// The selector produced an empty candidate set
    #[error("no agent available")]
    NoAgentAvailable,

    /// Every candidate agent was tried and none succeeded
    #[error("all agents failed after {} attempts", attempts.len())]
    AllAgentsFailed {
        /// Session the query was bound to
        session_id: String,
        /// Ordered per-agent outcomes
        attempts: Vec<AttemptRecord>,
    },

    /// Session store load/save failure (non-fatal to the query)
    #[error("session store error: {0}")]
    SessionStore(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error (serialization, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for an `InvalidRequest` with the given reason
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, used as the `error` field of API bodies
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidRequest { .. } => "invalid_request",
            Error::NoAgentAvailable => "no_agent_available",
            Error::AllAgentsFailed { .. } => "all_agents_failed",
            Error::SessionStore(_) => "session_store_error",
            Error::Configuration(_) => "configuration_error",
            Error::Internal(_) => "internal",
        }
    }

    /// Whether this error is surfaced to the caller as a request-level failure
    #[must_use]
    pub fn is_request_level(&self) -> bool {
        matches!(
            self,
            Error::InvalidRequest { .. } | Error::NoAgentAvailable | Error::AllAgentsFailed { .. }
        )
    }

    /// Attempts trail attached to this error (empty for most kinds)
    #[must_use]
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            Error::AllAgentsFailed { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::SessionStore(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}
