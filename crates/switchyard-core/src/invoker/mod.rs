//! Backend invoker
//!
//! Calls one agent with a per-call timeout, retries transient failures with
//! exponential backoff, and keeps a circuit breaker per agent. Breaker
//! transitions are mirrored into the registry: opening flags the agent
//! `degraded`, closing after a half-open probe restores it to `healthy`.

mod outcome;
pub mod protocol;
mod transport;

pub use outcome::{AgentAnswer, FailureKind, InvocationOutcome, OutcomeKind};
pub use transport::{AgentTransport, HttpTransport, TransportError};

use crate::query::Query;
use crate::registry::{AgentDescriptor, AgentHealth, AgentId, AgentRegistry};
use crate::session::Session;
use crate::utils::{
    retry_with_backoff, CircuitBreaker, CircuitBreakerConfig, Retried, RetryConfig, RetryError,
};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Retry and breaker policy shared by every agent
#[derive(Debug, Clone, Default)]
pub struct InvokerConfig {
    /// Retry policy for transient failures
    pub retry: RetryConfig,
    /// Per-agent breaker policy
    pub breaker: CircuitBreakerConfig,
}

/// Uniform caller for every registered agent
pub struct Invoker {
    transport: Arc<dyn AgentTransport>,
    registry: Arc<AgentRegistry>,
    config: InvokerConfig,
    breakers: DashMap<AgentId, Arc<CircuitBreaker>>,
}

impl Invoker {
    /// Create an invoker
    pub fn new(
        transport: Arc<dyn AgentTransport>,
        registry: Arc<AgentRegistry>,
        config: InvokerConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            config,
            breakers: DashMap::new(),
        }
    }

    /// The breaker guarding `agent_id`, created on first use
    pub fn breaker(&self, agent_id: &AgentId) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.get(agent_id) {
            return Arc::clone(breaker.value());
        }
        let entry = self.breakers.entry(agent_id.clone()).or_insert_with(|| {
            Arc::new(CircuitBreaker::new(
                agent_id.as_str(),
                self.config.breaker.clone(),
            ))
        });
        Arc::clone(entry.value())
    }

    /// Call `agent` for `query`, within `session`
    pub async fn invoke(
        &self,
        agent: &AgentDescriptor,
        query: &Query,
        session: &Session,
    ) -> InvocationOutcome {
        let started = Instant::now();
        let breaker = self.breaker(&agent.id);

        if !breaker.can_execute() {
            let remaining = breaker.remaining_cooldown();
            debug!(agent = %agent.id, remaining_ms = remaining.as_millis() as u64, "Circuit open, skipping call");
            return InvocationOutcome::Error {
                kind: FailureKind::CircuitOpen,
                detail: format!("circuit open for another {}ms", remaining.as_millis()),
                latency: started.elapsed(),
                retries: 0,
            };
        }

        let body = protocol::build_request(
            agent.kind,
            query,
            &session.session_id,
            session.continuation_for(&agent.id),
        );

        let result = retry_with_backoff(
            &self.config.retry,
            || self.call_once(agent, &body),
            TransportError::is_retryable,
        )
        .await;
        let latency = started.elapsed();

        match result {
            Ok(Retried { value, retries }) => match protocol::parse_reply(agent.kind, value) {
                Ok(payload) => {
                    self.on_success(agent, &breaker);
                    InvocationOutcome::Success {
                        payload,
                        latency,
                        retries,
                    }
                }
                Err(detail) => {
                    self.on_failure(agent, &breaker);
                    InvocationOutcome::Error {
                        kind: FailureKind::Decode,
                        detail,
                        latency,
                        retries,
                    }
                }
            },
            Err(RetryError {
                last_error,
                retries,
            }) => {
                match last_error.failure_kind() {
                    // The agent answered; it just did not like the request
                    Some(FailureKind::Rejected) => self.on_success(agent, &breaker),
                    _ => self.on_failure(agent, &breaker),
                }
                match last_error.failure_kind() {
                    None => InvocationOutcome::Timeout { latency, retries },
                    Some(kind) => InvocationOutcome::Error {
                        kind,
                        detail: last_error.to_string(),
                        latency,
                        retries,
                    },
                }
            }
        }
    }

    async fn call_once(
        &self,
        agent: &AgentDescriptor,
        body: &Value,
    ) -> Result<Value, TransportError> {
        tokio::time::timeout(agent.timeout, self.transport.send(agent, body))
            .await
            .unwrap_or(Err(TransportError::Timeout))
    }

    fn on_success(&self, agent: &AgentDescriptor, breaker: &CircuitBreaker) {
        if !breaker.record_success() {
            return;
        }
        let current = self.registry.get(&agent.id).map(|a| a.health);
        if current == Some(AgentHealth::Degraded) {
            self.registry.set_health(&agent.id, AgentHealth::Healthy);
            info!(agent = %agent.id, "Circuit closed, agent restored to healthy");
        }
    }

    fn on_failure(&self, agent: &AgentDescriptor, breaker: &CircuitBreaker) {
        if !breaker.record_failure() {
            return;
        }
        let current = self.registry.get(&agent.id).map(|a| a.health);
        if current.is_some_and(|h| h != AgentHealth::Unreachable) {
            self.registry.set_health(&agent.id, AgentHealth::Degraded);
            warn!(agent = %agent.id, "Circuit opened, agent flagged degraded");
        }
    }
}
