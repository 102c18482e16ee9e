//! Background health probing
//!
//! Each agent with a `health_url` is probed on a fixed interval. A failed
//! probe marks the agent `unreachable`; a successful one restores it. A
//! `degraded` flag set by the circuit breaker is left alone unless the agent
//! itself reports a status.

use super::{AgentDescriptor, AgentHealth, AgentRegistry};
use crate::error::{Error, Result};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Health checker settings
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// Time between probe rounds
    pub interval: Duration,
    /// Per-probe timeout
    pub timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Result of probing one agent
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    /// 2xx response, with the status the agent reported if it sent one
    Up(Option<AgentHealth>),
    /// Connection failure, timeout or non-2xx response
    Down(String),
}

/// Health after a probe, given the health before it
#[must_use]
pub fn assess(current: AgentHealth, probe: &ProbeResult) -> AgentHealth {
    match probe {
        ProbeResult::Down(_) => AgentHealth::Unreachable,
        ProbeResult::Up(Some(reported)) => *reported,
        ProbeResult::Up(None) if current == AgentHealth::Unreachable => AgentHealth::Healthy,
        ProbeResult::Up(None) => current,
    }
}

fn reported_status(body: &serde_json::Value) -> Option<AgentHealth> {
    let status = body.get("status")?.as_str()?.to_ascii_lowercase();
    match status.as_str() {
        "ok" | "healthy" | "up" | "pass" => Some(AgentHealth::Healthy),
        "degraded" | "warn" => Some(AgentHealth::Degraded),
        _ => None,
    }
}

/// Periodically probes agents and writes the results into the registry
pub struct HealthChecker {
    registry: Arc<AgentRegistry>,
    client: reqwest::Client,
    config: HealthCheckConfig,
}

impl HealthChecker {
    /// Create a checker
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(registry: Arc<AgentRegistry>, config: HealthCheckConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("health check client: {e}")))?;
        Ok(Self {
            registry,
            client,
            config,
        })
    }

    /// Probe a single health URL
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return ProbeResult::Down(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return ProbeResult::Down(format!("status {}", status.as_u16()));
        }

        let reported = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| reported_status(&body));
        ProbeResult::Up(reported)
    }

    async fn check_agent(&self, agent: &AgentDescriptor) -> bool {
        let Some(url) = agent.health_url.as_deref() else {
            return false;
        };

        let probe = self.probe(url).await;
        if let ProbeResult::Down(reason) = &probe {
            debug!(agent = %agent.id, reason = %reason, "Health probe failed");
        }

        match self.registry.mark_checked(&agent.id, &probe, Utc::now()) {
            Some((previous, next)) => {
                warn!(agent = %agent.id, from = %previous, to = %next, "Agent health changed");
                true
            }
            None => false,
        }
    }

    /// Probe every agent once, returns how many changed health
    pub async fn check_all(&self) -> usize {
        let snapshot = self.registry.snapshot();
        let results = join_all(snapshot.iter().map(|agent| self.check_agent(agent))).await;
        results.into_iter().filter(|changed| *changed).count()
    }

    /// Probe until `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            agents = self.registry.len(),
            "Health checker started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let changed = self.check_all().await;
                    debug!(changed, "Health check round complete");
                }
                _ = cancel.cancelled() => {
                    info!("Health checker shutting down");
                    break;
                }
            }
        }
    }
}
