use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default per-call timeout for an agent
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Agent identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create an agent id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Wire protocol family of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// General reasoning runtime exposing `/invocations`
    Reasoning,
    /// Warehouse-backed analytics agent
    Analytics,
}

impl AgentKind {
    /// Lowercase kind name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reasoning => "reasoning",
            Self::Analytics => "analytics",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reasoning" => Ok(Self::Reasoning),
            "analytics" => Ok(Self::Analytics),
            other => Err(format!("unknown agent kind: {other}")),
        }
    }
}

/// Health as last observed by the health checker or the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentHealth {
    /// Serving normally
    #[default]
    Healthy,
    /// Reachable but failing or slow
    Degraded,
    /// Health probe failed
    Unreachable,
}

impl AgentHealth {
    /// Sort rank, lower is better
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
            Self::Unreachable => 2,
        }
    }

    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for AgentHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the supervisor knows about one backend agent
///
/// Descriptors are immutable once shared; updates build a new descriptor and
/// replace the registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDescriptor {
    /// Unique id
    pub id: AgentId,
    /// Wire protocol family
    pub kind: AgentKind,
    /// Invocation URL
    pub endpoint: String,
    /// Probe URL, `None` disables health checking for this agent
    pub health_url: Option<String>,
    /// Capability tags the selector matches against
    pub capability_tags: BTreeSet<String>,
    /// Current health
    pub health: AgentHealth,
    /// Last completed health probe
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Per-call timeout
    pub timeout: Duration,
}

impl AgentDescriptor {
    /// Create a healthy descriptor with no tags and the default timeout
    #[must_use]
    pub fn new(id: impl Into<String>, kind: AgentKind, endpoint: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(id),
            kind,
            endpoint: endpoint.into(),
            health_url: None,
            capability_tags: BTreeSet::new(),
            health: AgentHealth::Healthy,
            last_checked_at: None,
            timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    /// Set capability tags
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capability_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the health probe URL
    #[must_use]
    pub fn with_health_url(mut self, url: impl Into<String>) -> Self {
        self.health_url = Some(url.into());
        self
    }

    /// Set the per-call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the health
    #[must_use]
    pub fn with_health(mut self, health: AgentHealth) -> Self {
        self.health = health;
        self
    }

    /// Whether the agent carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.capability_tags.contains(tag)
    }

    /// Number of `hints` this agent carries
    #[must_use]
    pub fn tag_overlap(&self, hints: &BTreeSet<String>) -> usize {
        self.capability_tags.intersection(hints).count()
    }
}
