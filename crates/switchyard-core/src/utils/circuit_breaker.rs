//! Per-agent circuit breaker
//!
//! Three states:
//! - Closed: calls pass through, consecutive failures are counted
//! - Open: calls are short-circuited until the cool-down elapses
//! - HalfOpen: probe calls pass through; one success closes, one failure reopens
//!
//! Transitions are reported back to the caller so it can mirror them into the
//! agent registry (`degraded` while open).

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests pass through
    Closed,
    /// Failures exceeded threshold - requests are rejected
    Open,
    /// Cool-down elapsed - probe requests pass through
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Configuration for circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Successes in half-open state needed to close the circuit
    pub success_threshold: u32,
    /// Cool-down before an open circuit lets a probe through
    pub reset_timeout: Duration,
    /// A failure older than this no longer counts toward the threshold
    pub failure_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 1,
            reset_timeout: Duration::from_secs(30),
            failure_window: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set failure threshold
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Set success threshold for half-open state
    #[must_use]
    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold.max(1);
        self
    }

    /// Set cool-down
    #[must_use]
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    /// Set failure window
    #[must_use]
    pub fn with_failure_window(mut self, window: Duration) -> Self {
        self.failure_window = window;
        self
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: u32,
    successes: u32,
    last_failure: Option<Instant>,
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding calls to one agent
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                last_failure: None,
                opened_at: None,
            }),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// Get the circuit breaker name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get the current state, applying the open -> half-open transition if due
    #[must_use]
    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.maybe_half_open(&mut inner);
        inner.state
    }

    /// Get current consecutive failure count
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    /// Time left before an open circuit admits a probe (zero unless open)
    #[must_use]
    pub fn remaining_cooldown(&self) -> Duration {
        let inner = self.lock();
        match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened_at)) => {
                self.config.reset_timeout.saturating_sub(opened_at.elapsed())
            }
            _ => Duration::ZERO,
        }
    }

    /// Check if the circuit allows a request
    #[must_use]
    pub fn can_execute(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// Record a successful call. Returns `true` if this closed a half-open circuit.
    pub fn record_success(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failures = 0;
                false
            }
            CircuitState::HalfOpen => {
                inner.successes += 1;
                debug!(
                    name = %self.name,
                    successes = inner.successes,
                    threshold = self.config.success_threshold,
                    "Circuit breaker success in half-open state"
                );
                if inner.successes >= self.config.success_threshold {
                    info!(name = %self.name, "Circuit breaker closed");
                    inner.state = CircuitState::Closed;
                    inner.failures = 0;
                    inner.successes = 0;
                    inner.opened_at = None;
                    true
                } else {
                    false
                }
            }
            // A call admitted before the circuit opened finished late; ignore it
            CircuitState::Open => false,
        }
    }

    /// Record a failed call. Returns `true` if this opened the circuit.
    pub fn record_failure(&self) -> bool {
        let mut inner = self.lock();
        let now = Instant::now();

        match inner.state {
            CircuitState::Closed => {
                if let Some(last) = inner.last_failure {
                    if now.duration_since(last) > self.config.failure_window {
                        inner.failures = 0;
                    }
                }
                inner.last_failure = Some(now);
                inner.failures += 1;

                debug!(
                    name = %self.name,
                    failures = inner.failures,
                    threshold = self.config.failure_threshold,
                    "Circuit breaker failure recorded"
                );

                if inner.failures >= self.config.failure_threshold {
                    self.open(&mut inner, now);
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                warn!(
                    name = %self.name,
                    "Circuit breaker failure in half-open state, reopening"
                );
                self.open(&mut inner, now);
                true
            }
            CircuitState::Open => false,
        }
    }

    /// Force the circuit back to closed
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.successes = 0;
        inner.last_failure = None;
        inner.opened_at = None;
    }

    fn open(&self, inner: &mut BreakerInner, now: Instant) {
        info!(
            name = %self.name,
            failures = inner.failures,
            cooldown_ms = self.config.reset_timeout.as_millis() as u64,
            "Circuit breaker opened"
        );
        inner.state = CircuitState::Open;
        inner.opened_at = Some(now);
        inner.successes = 0;
    }

    fn maybe_half_open(&self, inner: &mut BreakerInner) {
        if inner.state != CircuitState::Open {
            return;
        }
        let due = inner
            .opened_at
            .is_none_or(|opened_at| opened_at.elapsed() >= self.config.reset_timeout);
        if due {
            info!(name = %self.name, "Circuit breaker entering half-open state");
            inner.state = CircuitState::HalfOpen;
            inner.successes = 0;
            inner.failures = 0;
        }
    }
}
