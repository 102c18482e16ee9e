use super::types::{Counter, Summary};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Label key, `(name, value)` pairs in the order the caller supplied them
pub type LabelKey = Vec<(String, String)>;

fn to_key(labels: &[(&str, &str)]) -> LabelKey {
    labels
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// A labeled counter, one counter per label set
#[derive(Debug, Default, Clone)]
pub struct LabeledCounter {
    entries: Arc<RwLock<BTreeMap<LabelKey, Counter>>>,
}

impl LabeledCounter {
    /// Create a new labeled counter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by 1 for the given label set
    pub fn inc(&self, labels: &[(&str, &str)]) {
        let key = to_key(labels);

        let counters = self.entries.read().unwrap_or_else(|e| e.into_inner());
        if let Some(c) = counters.get(&key) {
            c.inc();
            return;
        }
        drop(counters);

        let mut counters = self.entries.write().unwrap_or_else(|e| e.into_inner());
        counters.entry(key).or_default().inc();
    }

    /// Current value for one label set (0 if never incremented)
    #[must_use]
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        let counters = self.entries.read().unwrap_or_else(|e| e.into_inner());
        counters.get(&to_key(labels)).map_or(0, Counter::get)
    }

    /// All entries, ordered by label set
    #[must_use]
    pub fn entries(&self) -> Vec<(LabelKey, u64)> {
        let counters = self.entries.read().unwrap_or_else(|e| e.into_inner());
        counters
            .iter()
            .map(|(labels, c)| (labels.clone(), c.get()))
            .collect()
    }
}

/// A labeled summary, one sliding-window summary per label set
#[derive(Debug, Default, Clone)]
pub struct LabeledSummary {
    entries: Arc<RwLock<BTreeMap<LabelKey, Summary>>>,
}

impl LabeledSummary {
    /// Create a new labeled summary
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a value for the given label set
    pub fn observe(&self, labels: &[(&str, &str)], value: f64) {
        let key = to_key(labels);

        let summaries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = summaries.get(&key) {
            s.observe(value);
            return;
        }
        drop(summaries);

        let mut summaries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        summaries.entry(key).or_default().observe(value);
    }

    /// Summary for one label set, if anything was observed
    #[must_use]
    pub fn get(&self, labels: &[(&str, &str)]) -> Option<Summary> {
        let summaries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        summaries.get(&to_key(labels)).cloned()
    }

    /// All entries, ordered by label set
    #[must_use]
    pub fn entries(&self) -> Vec<(LabelKey, Summary)> {
        let summaries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        summaries
            .iter()
            .map(|(labels, s)| (labels.clone(), s.clone()))
            .collect()
    }
}

/// Format label pairs as a Prometheus label string: `{key1="val1",key2="val2"}`
pub fn format_labels(labels: &[(String, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();
    format!("{{{}}}", parts.join(","))
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
