use crate::invoker::{AgentAnswer, FailureKind, InvocationOutcome, OutcomeKind};
use crate::registry::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Warning attached when the session could not be saved
pub const SESSION_SAVE_FAILED: &str = "session_save_failed";

/// One agent tried while answering a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Agent that was called
    pub agent_id: AgentId,
    /// Coarse outcome
    pub outcome: OutcomeKind,
    /// Wall time spent on this agent, retries included
    pub latency_ms: u64,
    /// Retries against this agent
    pub retries: u32,
    /// Failure classification for `error` outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl AttemptRecord {
    /// Summarize an invocation outcome
    #[must_use]
    pub fn from_outcome(agent_id: AgentId, outcome: &InvocationOutcome) -> Self {
        Self {
            agent_id,
            outcome: outcome.kind(),
            latency_ms: u64::try_from(outcome.latency().as_millis()).unwrap_or(u64::MAX),
            retries: outcome.retries(),
            error_kind: outcome.failure_kind(),
        }
    }
}

/// The single response produced for a successful query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    answer: Value,
    agent_used: AgentId,
    session_id: String,
    attempts: Vec<AttemptRecord>,
    metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl ResponseEnvelope {
    /// Merge the winning answer with the routing trail
    #[must_use]
    pub fn aggregate(
        payload: AgentAnswer,
        agent_used: AgentId,
        session_id: String,
        attempts: Vec<AttemptRecord>,
        metadata: Map<String, Value>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            answer: payload.answer,
            agent_used,
            session_id,
            attempts,
            metadata,
            usage: payload.usage,
            warnings,
        }
    }

    /// Agent-defined answer payload
    #[must_use]
    pub fn answer(&self) -> &Value {
        &self.answer
    }

    /// Answer as plain text
    #[must_use]
    pub fn answer_text(&self) -> String {
        match &self.answer {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Agent that produced the answer
    #[must_use]
    pub fn agent_used(&self) -> &AgentId {
        &self.agent_used
    }

    /// Session the query was bound to
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Every agent tried, in order
    #[must_use]
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    /// Metadata echoed from the query
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Usage reported by the agent
    #[must_use]
    pub fn usage(&self) -> Option<&Value> {
        self.usage.as_ref()
    }

    /// Non-fatal notices
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
