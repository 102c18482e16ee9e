//! Agent registry
//!
//! Holds one descriptor per backend agent. The selector reads immutable
//! snapshots; only the health checker and circuit-breaker feedback write.

mod health;
mod store;
mod types;

pub use health::{assess, HealthCheckConfig, HealthChecker, ProbeResult};
pub use store::{AgentRegistry, RegistrySnapshot};
pub use types::{AgentDescriptor, AgentHealth, AgentId, AgentKind, DEFAULT_AGENT_TIMEOUT};
