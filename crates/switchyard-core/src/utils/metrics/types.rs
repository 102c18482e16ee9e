use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A thread-safe counter metric
#[derive(Debug, Default, Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    /// Create a new counter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the counter by a specific amount
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Get the current value
    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A thread-safe gauge metric (can go up and down)
#[derive(Debug, Default, Clone)]
pub struct Gauge {
    value: Arc<AtomicI64>,
}

impl Gauge {
    /// Create a new gauge
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gauge value
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Increment the gauge by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement the gauge by 1
    pub fn dec(&self) {
        self.value.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get the current value
    #[must_use]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Bucketed histogram for request durations (ms)
#[derive(Debug, Clone)]
pub struct Histogram {
    bounds: Arc<Vec<f64>>,
    buckets: Arc<Vec<AtomicU64>>,
    // Sum in thousandths so it fits in an atomic integer
    sum_milli: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Histogram {
    /// Create a histogram with default latency buckets (ms)
    #[must_use]
    pub fn new() -> Self {
        Self::with_buckets(vec![
            5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0,
        ])
    }

    /// Create a histogram with custom bucket bounds
    #[must_use]
    pub fn with_buckets(bounds: Vec<f64>) -> Self {
        let buckets = bounds.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds: Arc::new(bounds),
            buckets: Arc::new(buckets),
            sum_milli: Arc::new(AtomicU64::new(0)),
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Observe a value
    pub fn observe(&self, value: f64) {
        self.sum_milli
            .fetch_add((value.max(0.0) * 1000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (bound, bucket) in self.bounds.iter().zip(self.buckets.iter()) {
            if value <= *bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get the count of observations
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get the sum of all observations
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum_milli.load(Ordering::Relaxed) as f64 / 1000.0
    }

    /// Cumulative bucket counts as `(upper bound, count)`
    #[must_use]
    pub fn bucket_counts(&self) -> Vec<(f64, u64)> {
        self.bounds
            .iter()
            .zip(self.buckets.iter())
            .map(|(bound, count)| (*bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantiles reported by [`Summary`]
pub const QUANTILES: [f64; 2] = [0.5, 0.95];

/// Sliding-window summary that estimates quantiles over the latest samples
#[derive(Debug, Clone)]
pub struct Summary {
    window: Arc<Mutex<VecDeque<f64>>>,
    capacity: usize,
    sum_milli: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Summary {
    /// Default number of retained samples
    pub const DEFAULT_WINDOW: usize = 1024;

    /// Create a summary with the default window
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Self::DEFAULT_WINDOW)
    }

    /// Create a summary retaining at most `capacity` samples
    #[must_use]
    pub fn with_window(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
            sum_milli: Arc::new(AtomicU64::new(0)),
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Observe a value
    pub fn observe(&self, value: f64) {
        self.sum_milli
            .fetch_add((value.max(0.0) * 1000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(value);
    }

    /// Nearest-rank quantile over the retained window, `None` when empty
    #[must_use]
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if window.is_empty() {
            return None;
        }
        let mut samples: Vec<f64> = window.iter().copied().collect();
        drop(window);

        samples.sort_by(f64::total_cmp);
        let rank = (q.clamp(0.0, 1.0) * samples.len() as f64).ceil() as usize;
        let index = rank.saturating_sub(1).min(samples.len() - 1);
        Some(samples[index])
    }

    /// Total observations (not limited to the window)
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of all observations
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum_milli.load(Ordering::Relaxed) as f64 / 1000.0
    }
}

impl Default for Summary {
    fn default() -> Self {
        Self::new()
    }
}
