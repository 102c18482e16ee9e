use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Coarse outcome reported in the attempts trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// Agent answered
    Success,
    /// Per-call timeout elapsed on the last try
    Timeout,
    /// Any other failure
    Error,
}

impl OutcomeKind {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an invocation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection refused, reset, DNS failure
    Transport,
    /// 5xx, 408 or 429 from the agent
    Server,
    /// Agent rejected the request (other 4xx)
    Rejected,
    /// Response body could not be understood
    Decode,
    /// Circuit breaker is open, no call was made
    CircuitOpen,
}

impl FailureKind {
    /// Snake-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Server => "server",
            Self::Rejected => "rejected",
            Self::Decode => "decode",
            Self::CircuitOpen => "circuit_open",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded agent reply
#[derive(Debug, Clone, PartialEq)]
pub struct AgentAnswer {
    /// Agent-defined answer payload
    pub answer: Value,
    /// State the agent wants echoed back on the next turn
    pub continuation: Option<Value>,
    /// Usage figures reported by the agent
    pub usage: Option<Value>,
}

impl AgentAnswer {
    /// Text form of the answer, used for session summaries and chat replies
    #[must_use]
    pub fn text(&self) -> String {
        match &self.answer {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Result of one invoker call, retries included
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    /// Agent answered
    Success {
        /// Decoded reply
        payload: AgentAnswer,
        /// Wall time including retries
        latency: Duration,
        /// Retries performed
        retries: u32,
    },
    /// The last try timed out
    Timeout {
        /// Wall time including retries
        latency: Duration,
        /// Retries performed
        retries: u32,
    },
    /// The call failed for another reason
    Error {
        /// Failure classification
        kind: FailureKind,
        /// Human-readable detail
        detail: String,
        /// Wall time including retries
        latency: Duration,
        /// Retries performed
        retries: u32,
    },
}

impl InvocationOutcome {
    /// Coarse kind
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success { .. } => OutcomeKind::Success,
            Self::Timeout { .. } => OutcomeKind::Timeout,
            Self::Error { .. } => OutcomeKind::Error,
        }
    }

    /// Whether the agent answered
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Wall time spent on this agent
    #[must_use]
    pub fn latency(&self) -> Duration {
        match self {
            Self::Success { latency, .. }
            | Self::Timeout { latency, .. }
            | Self::Error { latency, .. } => *latency,
        }
    }

    /// Retries performed against this agent
    #[must_use]
    pub fn retries(&self) -> u32 {
        match self {
            Self::Success { retries, .. }
            | Self::Timeout { retries, .. }
            | Self::Error { retries, .. } => *retries,
        }
    }

    /// Failure classification, `None` unless this is an `Error`
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
