use crate::invoker::InvocationOutcome;
use crate::registry::AgentId;
use crate::utils::{metrics_global, Counter, Gauge, Histogram, LabeledCounter, LabeledSummary, MetricsRegistry};
use std::time::Duration;

/// Per-agent call count
pub const AGENT_CALLS_TOTAL: &str = "switchyard_agent_calls_total";
/// Per-agent, per-outcome count
pub const AGENT_OUTCOMES_TOTAL: &str = "switchyard_agent_outcomes_total";
/// Per-agent latency summary with p50/p95
pub const AGENT_LATENCY_MS: &str = "switchyard_agent_latency_ms";
/// Queries by result
pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";
/// End-to-end query duration
pub const REQUEST_DURATION_MS: &str = "switchyard_request_duration_ms";
/// Queries currently being handled
pub const REQUESTS_IN_FLIGHT: &str = "switchyard_requests_in_flight";
/// Supervisor faults (panics caught by the HTTP layer)
pub const SUPERVISOR_FAULTS_TOTAL: &str = "switchyard_supervisor_faults_total";

/// Metric handles used by the supervisor and the HTTP layer
#[derive(Debug, Clone)]
pub struct CoreMetrics {
    agent_calls: LabeledCounter,
    agent_outcomes: LabeledCounter,
    agent_latency: LabeledSummary,
    requests: LabeledCounter,
    request_duration: Histogram,
    in_flight: Gauge,
    faults: Counter,
}

impl CoreMetrics {
    /// Register the metric families in `registry`
    #[must_use]
    pub fn new(registry: &MetricsRegistry) -> Self {
        Self {
            agent_calls: registry.labeled_counter(AGENT_CALLS_TOTAL),
            agent_outcomes: registry.labeled_counter(AGENT_OUTCOMES_TOTAL),
            agent_latency: registry.labeled_summary(AGENT_LATENCY_MS),
            requests: registry.labeled_counter(REQUESTS_TOTAL),
            request_duration: registry.histogram(REQUEST_DURATION_MS),
            in_flight: registry.gauge(REQUESTS_IN_FLIGHT),
            faults: registry.counter(SUPERVISOR_FAULTS_TOTAL),
        }
    }

    /// Handles on the process-wide registry
    #[must_use]
    pub fn global() -> Self {
        Self::new(metrics_global::registry())
    }

    /// Record one invoker call
    pub fn record_attempt(&self, agent: &AgentId, outcome: &InvocationOutcome) {
        let agent = agent.as_str();
        let label = match outcome.failure_kind() {
            Some(kind) => kind.as_str(),
            None => outcome.kind().as_str(),
        };

        self.agent_calls.inc(&[("agent", agent)]);
        self.agent_outcomes
            .inc(&[("agent", agent), ("outcome", label)]);
        self.agent_latency
            .observe(&[("agent", agent)], duration_ms(outcome.latency()));
    }

    /// Record a finished query; `result` is `ok` or an error code
    pub fn record_request(&self, result: &str, elapsed: Duration) {
        self.requests.inc(&[("result", result)]);
        self.request_duration.observe(duration_ms(elapsed));
    }

    /// Mark a query as started; the guard marks it finished on drop
    #[must_use]
    pub fn start_request(&self) -> InFlightGuard {
        self.in_flight.inc();
        InFlightGuard {
            gauge: self.in_flight.clone(),
        }
    }

    /// Count a supervisor fault
    pub fn record_fault(&self) {
        self.faults.inc();
    }

    /// Faults counted so far
    #[must_use]
    pub fn fault_count(&self) -> u64 {
        self.faults.get()
    }

    /// Calls made to `agent` so far
    #[must_use]
    pub fn agent_calls(&self, agent: &str) -> u64 {
        self.agent_calls.get(&[("agent", agent)])
    }

    /// Latency quantile for `agent`, in milliseconds
    #[must_use]
    pub fn agent_latency_quantile(&self, agent: &str, q: f64) -> Option<f64> {
        self.agent_latency
            .get(&[("agent", agent)])
            .and_then(|summary| summary.quantile(q))
    }
}

impl Default for CoreMetrics {
    fn default() -> Self {
        Self::global()
    }
}

/// Decrements the in-flight gauge when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    gauge: Gauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
