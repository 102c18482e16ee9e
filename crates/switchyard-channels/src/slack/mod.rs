//! Slack - Events API adapter
//!
//! Verifies signed webhook requests, turns `app_mention` and direct-message
//! events into [`ChatMessage`](switchyard_core::ChatMessage)s, and posts
//! answers back into the originating thread.

use std::time::Duration;

/// Signature verification and Web API calls
pub mod api;
/// Events API payload parsing
pub mod events;

pub use events::SlackPayload;


/// Maximum allowed timestamp age in seconds (5 minutes)
pub(crate) const MAX_TIMESTAMP_AGE_SECS: u64 = 300;

/// Default time allowed before acknowledging an event
pub const DEFAULT_ACK_BUDGET: Duration = Duration::from_millis(2500);

/// Default Web API base URL
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Constant-time comparison to prevent timing attacks
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Slack adapter configuration
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Signing secret for request verification
    pub signing_secret: String,
    /// Bot token (xoxb-...) used for replies
    pub bot_token: String,
    /// Allowed workspace IDs (empty = allow all)
    pub allowed_workspaces: Vec<String>,
    /// How long the webhook may wait before acknowledging
    pub ack_budget: Duration,
    /// Web API base URL
    pub api_base: String,
}

impl SlackConfig {
    /// Create with a signing secret and bot token
    #[must_use]
    pub fn new(signing_secret: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            bot_token: bot_token.into(),
            allowed_workspaces: Vec::new(),
            ack_budget: DEFAULT_ACK_BUDGET,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Set allowed workspaces
    #[must_use]
    pub fn with_allowed_workspaces(mut self, workspaces: Vec<String>) -> Self {
        self.allowed_workspaces = workspaces;
        self
    }

    /// Set the acknowledgement budget
    #[must_use]
    pub fn with_ack_budget(mut self, budget: Duration) -> Self {
        self.ack_budget = budget;
        self
    }

    /// Point Web API calls somewhere else
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }
}

/// Slack Events API adapter
#[derive(Debug, Clone)]
pub struct SlackAdapter {
    pub(crate) config: SlackConfig,
    pub(crate) http: reqwest::Client,
}

impl SlackAdapter {
    /// Create a new Slack adapter
    #[must_use]
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Adapter configuration
    #[must_use]
    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    /// Check if a workspace is allowed
    #[must_use]
    pub fn is_workspace_allowed(&self, workspace_id: &str) -> bool {
        self.config.allowed_workspaces.is_empty()
            || self
                .config
                .allowed_workspaces
                .iter()
                .any(|w| w == workspace_id)
    }
}
