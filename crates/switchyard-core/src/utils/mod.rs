//! Utility modules for switchyard-core
//!
//! - retry: Retry logic with exponential backoff
//! - circuit_breaker: Per-agent circuit breaker
//! - metrics: Lightweight metrics collection

mod circuit_breaker;
pub mod metrics;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use metrics::{
    global as metrics_global, Counter, Gauge, Histogram, LabeledCounter, LabeledSummary,
    MetricsRegistry, Summary,
};
pub use retry::{retry_with_backoff, Retried, RetryConfig, RetryError};
