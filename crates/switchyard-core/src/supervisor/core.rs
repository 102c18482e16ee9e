use super::envelope::{AttemptRecord, ResponseEnvelope, SESSION_SAVE_FAILED};
use super::metrics::CoreMetrics;
use crate::error::{Error, Result};
use crate::invoker::{InvocationOutcome, Invoker};
use crate::query::{non_blank, normalize, Inbound, Query};
use crate::registry::{AgentId, AgentRegistry};
use crate::routing::{select, RoutingRules};
use crate::session::{Session, SessionStore};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default cap on stored turns per session
pub const DEFAULT_MAX_TURNS: usize = 50;

/// Steps a query moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Raw payload accepted
    Received,
    /// Payload reduced to a `Query`
    Normalized,
    /// Prior session loaded (or a fresh one created)
    SessionLoaded,
    /// Candidate list being computed
    Routing,
    /// Calling candidates in order
    Invoking,
    /// Building the envelope and recording the turn
    Aggregating,
    /// Session save attempted
    Persisted,
    /// Envelope returned
    Done,
    /// Request-level failure returned
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Normalized => "normalized",
            Self::SessionLoaded => "session_loaded",
            Self::Routing => "routing",
            Self::Invoking => "invoking",
            Self::Aggregating => "aggregating",
            Self::Persisted => "persisted",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Supervisor settings
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Turns kept per session
    pub max_turns: usize,
    /// Routing rules handed to the selector
    pub routing: RoutingRules,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            routing: RoutingRules::default(),
        }
    }
}

/// Drives one query from payload to envelope
pub struct Supervisor {
    registry: Arc<AgentRegistry>,
    invoker: Invoker,
    store: Arc<dyn SessionStore>,
    config: SupervisorConfig,
    metrics: CoreMetrics,
}

impl Supervisor {
    /// Create a supervisor
    pub fn new(
        registry: Arc<AgentRegistry>,
        invoker: Invoker,
        store: Arc<dyn SessionStore>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            registry,
            invoker,
            store,
            config,
            metrics: CoreMetrics::global(),
        }
    }

    /// Use a specific metrics handle set instead of the global registry
    #[must_use]
    pub fn with_metrics(mut self, metrics: CoreMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Agent registry
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Session store
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Metric handles
    pub fn metrics(&self) -> &CoreMetrics {
        &self.metrics
    }

    /// Candidates the selector would pick right now
    #[must_use]
    pub fn candidates(&self, query: &Query) -> Vec<AgentId> {
        select(query, &self.registry.snapshot(), &self.config.routing)
    }

    /// Normalize a raw payload, then handle it
    pub async fn handle_inbound(&self, inbound: Inbound) -> Result<ResponseEnvelope> {
        let started = Instant::now();
        debug!(stage = %Stage::Received, "Query stage");

        match normalize(inbound) {
            Ok(query) => self.handle(query).await,
            Err(e) => {
                debug!(stage = %Stage::Failed, reason = e.code(), "Query stage");
                self.metrics.record_request(e.code(), started.elapsed());
                Err(e)
            }
        }
    }

    /// Handle a normalized query
    pub async fn handle(&self, query: Query) -> Result<ResponseEnvelope> {
        let started = Instant::now();
        let _in_flight = self.metrics.start_request();

        let result = self.run(query).await;
        let label = match &result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        self.metrics.record_request(label, started.elapsed());
        result
    }

    async fn run(&self, query: Query) -> Result<ResponseEnvelope> {
        if query.text.trim().is_empty() {
            return Err(Error::invalid("empty_text"));
        }

        let session_id = query
            .session_id
            .clone()
            .and_then(non_blank)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.transition(&session_id, Stage::Normalized);

        let mut session = self.load_session(&session_id).await;
        self.transition(&session_id, Stage::SessionLoaded);

        self.transition(&session_id, Stage::Routing);
        let snapshot = self.registry.snapshot();
        let candidates = select(&query, &snapshot, &self.config.routing);
        if candidates.is_empty() {
            self.fail(&session_id, "no_agent_available");
            return Err(Error::NoAgentAvailable);
        }
        debug!(
            session_id = %session_id,
            candidates = ?candidates.iter().map(AgentId::as_str).collect::<Vec<_>>(),
            "Candidates selected"
        );

        self.transition(&session_id, Stage::Invoking);
        let mut attempts = Vec::with_capacity(candidates.len());
        let mut winner = None;

        for agent_id in &candidates {
            let Some(agent) = snapshot.get(agent_id.as_str()) else {
                continue;
            };

            let outcome = self.invoker.invoke(agent, &query, &session).await;
            self.metrics.record_attempt(agent_id, &outcome);
            attempts.push(AttemptRecord::from_outcome(agent_id.clone(), &outcome));

            match outcome {
                InvocationOutcome::Success { payload, .. } => {
                    winner = Some((agent_id.clone(), payload));
                    break;
                }
                other => {
                    warn!(
                        session_id = %session_id,
                        agent = %agent_id,
                        outcome = %other.kind(),
                        error_kind = ?other.failure_kind(),
                        "Agent attempt failed, trying next candidate"
                    );
                }
            }
        }

        let Some((agent_used, payload)) = winner else {
            self.fail(&session_id, "all_agents_failed");
            return Err(Error::AllAgentsFailed {
                session_id,
                attempts,
            });
        };

        self.transition(&session_id, Stage::Aggregating);
        session.record_turn(
            query.text.clone(),
            agent_used.clone(),
            &payload.text(),
            self.config.max_turns,
        );
        session.set_continuation(agent_used.clone(), payload.continuation.clone());

        let mut warnings = Vec::new();
        if let Err(e) = self.store.save(&session).await {
            warn!(session_id = %session_id, error = %e, "Session save failed");
            warnings.push(SESSION_SAVE_FAILED.to_string());
        }
        self.transition(&session_id, Stage::Persisted);

        info!(
            session_id = %session_id,
            agent = %agent_used,
            attempts = attempts.len(),
            "Query answered"
        );

        let envelope = ResponseEnvelope::aggregate(
            payload,
            agent_used,
            session_id.clone(),
            attempts,
            query.metadata,
            warnings,
        );
        self.transition(&session_id, Stage::Done);
        Ok(envelope)
    }

    async fn load_session(&self, session_id: &str) -> Session {
        match self.store.load(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => Session::new(session_id),
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    backend = self.store.backend_name(),
                    error = %e,
                    "Session load failed, starting a new session"
                );
                Session::new(session_id)
            }
        }
    }

    fn transition(&self, session_id: &str, stage: Stage) {
        debug!(session_id = %session_id, stage = %stage, "Query stage");
    }

    fn fail(&self, session_id: &str, reason: &str) {
        debug!(session_id = %session_id, stage = %Stage::Failed, reason, "Query stage");
    }
}
