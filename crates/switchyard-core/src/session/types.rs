use crate::registry::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Characters of the answer kept as a turn summary
pub const SUMMARY_CHARS: usize = 200;

/// One answered query within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Query text as normalized
    pub query: String,
    /// Agent that produced the answer
    pub agent_id: AgentId,
    /// Leading part of the answer
    pub summary: String,
    /// When the turn completed
    pub timestamp: DateTime<Utc>,
}

/// Conversation state persisted between queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session id
    pub session_id: String,
    /// Turns, oldest first
    #[serde(default)]
    pub turns: Vec<Turn>,
    /// Per-agent state the agent asked to have echoed back (e.g. a thread id)
    #[serde(default)]
    pub continuation: BTreeMap<AgentId, Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last time a turn was recorded
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create an empty session
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
            continuation: BTreeMap::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Append a turn, dropping the oldest ones beyond `max_turns`
    pub fn record_turn(
        &mut self,
        query: impl Into<String>,
        agent_id: AgentId,
        answer_text: &str,
        max_turns: usize,
    ) {
        let now = Utc::now();
        self.turns.push(Turn {
            query: query.into(),
            agent_id,
            summary: summarize(answer_text),
            timestamp: now,
        });
        self.last_activity = now;

        let max_turns = max_turns.max(1);
        if self.turns.len() > max_turns {
            let excess = self.turns.len() - max_turns;
            self.turns.drain(..excess);
        }
    }

    /// Continuation state stored for an agent
    #[must_use]
    pub fn continuation_for(&self, agent_id: &AgentId) -> Option<&Value> {
        self.continuation.get(agent_id)
    }

    /// Replace an agent's continuation; `None` leaves the existing one in place
    pub fn set_continuation(&mut self, agent_id: AgentId, state: Option<Value>) {
        if let Some(state) = state {
            self.continuation.insert(agent_id, state);
        }
    }

    /// Number of stored turns
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Most recent turn
    #[must_use]
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// First [`SUMMARY_CHARS`] characters of `text`
#[must_use]
pub fn summarize(text: &str) -> String {
    text.chars().take(SUMMARY_CHARS).collect()
}
