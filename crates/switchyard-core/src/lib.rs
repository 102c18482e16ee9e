//! Switchyard Core - Query Supervision Engine
//!
//! Routes user queries to heterogeneous backend agents and hands back a
//! single answer:
//! - Query: normalizing API and chat payloads into one `Query`
//! - Registry: agent descriptors, health state and health probing
//! - Routing: deterministic candidate ordering
//! - Invoker: timeouts, retries and per-agent circuit breakers
//! - Session: conversation history with memory and Redis backends
//! - Supervisor: the query lifecycle and the response envelope
//! - Utils: retry, circuit breaker and metrics primitives

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod invoker;
pub mod query;
pub mod registry;
pub mod routing;
pub mod session;
pub mod shutdown;
pub mod supervisor;
pub mod utils;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use invoker::{
    AgentAnswer, AgentTransport, FailureKind, HttpTransport, InvocationOutcome, Invoker,
    InvokerConfig, OutcomeKind, TransportError,
};
pub use query::{derive_session_id, normalize, ChatMessage, ChatPlatform, Inbound, Query, QuerySource};
pub use registry::{
    AgentDescriptor, AgentHealth, AgentId, AgentKind, AgentRegistry, HealthCheckConfig,
    HealthChecker, RegistrySnapshot,
};
pub use routing::{select, RoutingRules};
pub use session::{MemoryStore, RedisStore, Session, SessionStore, Turn};
pub use shutdown::{wait_for_shutdown_signal, ShutdownController, ShutdownPhase, TaskGuard};
pub use supervisor::{
    AttemptRecord, CoreMetrics, ResponseEnvelope, Stage, Supervisor, SupervisorConfig,
    DEFAULT_MAX_TURNS, SESSION_SAVE_FAILED,
};
pub use utils::{CircuitBreakerConfig, RetryConfig};
