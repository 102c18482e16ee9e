use super::labeled::{format_labels, LabeledCounter, LabeledSummary};
use super::types::{Counter, Gauge, Histogram, QUANTILES};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, RwLock};

type Family<M> = Arc<RwLock<BTreeMap<String, M>>>;

fn get_or_create<M: Clone + Default>(family: &Family<M>, name: &str) -> M {
    let metrics = family.read().unwrap_or_else(|e| e.into_inner());
    if let Some(metric) = metrics.get(name) {
        return metric.clone();
    }
    drop(metrics);

    let mut metrics = family.write().unwrap_or_else(|e| e.into_inner());
    metrics.entry(name.to_string()).or_default().clone()
}

/// Metrics registry for managing named metric families
#[derive(Debug, Default, Clone)]
pub struct MetricsRegistry {
    counters: Family<Counter>,
    gauges: Family<Gauge>,
    histograms: Family<Histogram>,
    labeled_counters: Family<LabeledCounter>,
    labeled_summaries: Family<LabeledSummary>,
}

impl MetricsRegistry {
    /// Create a new metrics registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a counter
    pub fn counter(&self, name: &str) -> Counter {
        get_or_create(&self.counters, name)
    }

    /// Get or create a gauge
    pub fn gauge(&self, name: &str) -> Gauge {
        get_or_create(&self.gauges, name)
    }

    /// Get or create a histogram
    pub fn histogram(&self, name: &str) -> Histogram {
        get_or_create(&self.histograms, name)
    }

    /// Get or create a labeled counter
    pub fn labeled_counter(&self, name: &str) -> LabeledCounter {
        get_or_create(&self.labeled_counters, name)
    }

    /// Get or create a labeled summary
    pub fn labeled_summary(&self, name: &str) -> LabeledSummary {
        get_or_create(&self.labeled_summaries, name)
    }

    /// Export metrics in Prometheus text format, families sorted by name
    #[must_use]
    pub fn export_prometheus(&self) -> String {
        let mut out = String::new();

        let counters = self.counters.read().unwrap_or_else(|e| e.into_inner());
        for (name, counter) in counters.iter() {
            let _ = writeln!(out, "# TYPE {name} counter\n{name} {}", counter.get());
        }
        drop(counters);

        let gauges = self.gauges.read().unwrap_or_else(|e| e.into_inner());
        for (name, gauge) in gauges.iter() {
            let _ = writeln!(out, "# TYPE {name} gauge\n{name} {}", gauge.get());
        }
        drop(gauges);

        let histograms = self.histograms.read().unwrap_or_else(|e| e.into_inner());
        for (name, histogram) in histograms.iter() {
            let _ = writeln!(out, "# TYPE {name} histogram");
            for (bound, count) in histogram.bucket_counts() {
                let _ = writeln!(out, "{name}_bucket{{le=\"{bound}\"}} {count}");
            }
            let _ = writeln!(out, "{name}_bucket{{le=\"+Inf\"}} {}", histogram.count());
            let _ = writeln!(out, "{name}_sum {}", histogram.sum());
            let _ = writeln!(out, "{name}_count {}", histogram.count());
        }
        drop(histograms);

        let labeled_counters = self
            .labeled_counters
            .read()
            .unwrap_or_else(|e| e.into_inner());
        for (name, lc) in labeled_counters.iter() {
            let _ = writeln!(out, "# TYPE {name} counter");
            for (labels, value) in lc.entries() {
                let _ = writeln!(out, "{name}{} {value}", format_labels(&labels));
            }
        }
        drop(labeled_counters);

        let labeled_summaries = self
            .labeled_summaries
            .read()
            .unwrap_or_else(|e| e.into_inner());
        for (name, ls) in labeled_summaries.iter() {
            let _ = writeln!(out, "# TYPE {name} summary");
            for (labels, summary) in ls.entries() {
                for q in QUANTILES {
                    let Some(value) = summary.quantile(q) else {
                        continue;
                    };
                    let mut with_quantile = labels.clone();
                    with_quantile.push(("quantile".to_string(), q.to_string()));
                    let _ = writeln!(out, "{name}{} {value}", format_labels(&with_quantile));
                }
                let label_str = format_labels(&labels);
                let _ = writeln!(out, "{name}_sum{label_str} {}", summary.sum());
                let _ = writeln!(out, "{name}_count{label_str} {}", summary.count());
            }
        }

        out
    }
}
