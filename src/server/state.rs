//! Shared handler state

use std::sync::Arc;
use std::time::Duration;
use switchyard_channels::SlackAdapter;
use switchyard_core::utils::MetricsRegistry;
use switchyard_core::{ShutdownController, Supervisor};

/// Everything the HTTP handlers need, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<Supervisor>,
    pub slack: Option<Arc<SlackAdapter>>,
    pub shutdown: Arc<ShutdownController>,
    /// Registry exported by `/metrics`
    pub metrics: MetricsRegistry,
    /// Faults tolerated before `/ping` reports unhealthy (0 = never)
    pub fault_threshold: u64,
}

impl AppState {
    pub fn new(supervisor: Arc<Supervisor>, shutdown: Arc<ShutdownController>) -> Self {
        Self {
            supervisor,
            slack: None,
            shutdown,
            metrics: switchyard_core::utils::metrics_global::registry().clone(),
            fault_threshold: 0,
        }
    }

    #[must_use]
    pub fn with_slack(mut self, adapter: Option<Arc<SlackAdapter>>) -> Self {
        self.slack = adapter;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub fn with_fault_threshold(mut self, threshold: u64) -> Self {
        self.fault_threshold = threshold;
        self
    }

    /// Acknowledgement budget for chat webhooks
    pub fn ack_budget(&self) -> Option<Duration> {
        self.slack.as_ref().map(|s| s.config().ack_budget)
    }
}
