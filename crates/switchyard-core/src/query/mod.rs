//! Canonical query representation
//!
//! Every inbound trigger (direct API call, chat webhook) is reduced to a
//! [`Query`] by [`normalize`] before it reaches the supervisor.

mod normalizer;

pub use normalizer::{derive_session_id, normalize, ChatMessage, Inbound};
pub(crate) use normalizer::non_blank;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Chat platforms with an inbound adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatPlatform {
    /// Slack Events API
    Slack,
}

impl ChatPlatform {
    /// Lowercase platform name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slack => "slack",
        }
    }
}

impl std::fmt::Display for ChatPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a query came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuerySource {
    /// Direct JSON API call
    #[default]
    Api,
    /// Chat-platform webhook
    Chat(ChatPlatform),
}

impl QuerySource {
    /// Stable name used in logs and metrics
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Chat(platform) => platform.as_str(),
        }
    }
}

/// Normalized query, the only shape the supervisor accepts
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Non-empty question text
    pub text: String,
    /// Caller-supplied or derived session id
    pub session_id: Option<String>,
    /// Routing hints (`domain`, `capabilities`, ...) and agent-visible context
    pub context: Map<String, Value>,
    /// Agent id or capability tag the caller would like to answer
    pub agent_preference: Option<String>,
    /// Opaque data echoed back in the envelope
    pub metadata: Map<String, Value>,
    /// Trigger source
    pub source: QuerySource,
    /// Upper bound the caller can wait for an answer
    pub latency_budget: Option<Duration>,
}

impl Query {
    /// Create an API query with only text set
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: None,
            context: Map::new(),
            agent_preference: None,
            metadata: Map::new(),
            source: QuerySource::Api,
            latency_budget: None,
        }
    }

    /// Set the session id
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Add a context entry
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Set the agent preference
    #[must_use]
    pub fn with_preference(mut self, preference: impl Into<String>) -> Self {
        self.agent_preference = Some(preference.into());
        self
    }

    /// Add a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the latency budget
    #[must_use]
    pub fn with_latency_budget(mut self, budget: Duration) -> Self {
        self.latency_budget = Some(budget);
        self
    }
}

#[cfg(test)]
mod tests;
