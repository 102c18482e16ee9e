//! Metrics collection for observability
//!
//! In-process counters, gauges, histograms and sliding-window summaries,
//! exported in Prometheus text format by the `/metrics` route.

pub mod labeled;
pub mod registry;
pub mod types;

pub use labeled::{LabeledCounter, LabeledSummary};
pub use registry::MetricsRegistry;
pub use types::{Counter, Gauge, Histogram, Summary, QUANTILES};

/// Process-wide metrics registry
pub mod global {
    use super::MetricsRegistry;
    use std::sync::OnceLock;

    static REGISTRY: OnceLock<MetricsRegistry> = OnceLock::new();

    /// Get the global metrics registry
    pub fn registry() -> &'static MetricsRegistry {
        REGISTRY.get_or_init(MetricsRegistry::new)
    }
}
