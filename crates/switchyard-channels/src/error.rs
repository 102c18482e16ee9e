//! Error types for switchyard-channels

use thiserror::Error;

/// Channel error type
#[derive(Debug, Error)]
pub enum Error {
    /// Slack rejected the request or answered with `ok: false`
    #[error("slack error: {0}")]
    Slack(String),

    /// Payload could not be parsed
    #[error("message parsing error: {0}")]
    Parse(String),

    /// Network error talking to the platform
    #[error("network error: {0}")]
    Network(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
