//! Supervisor
//!
//! `Received -> Normalized -> SessionLoaded -> Routing -> Invoking ->
//! Aggregating -> Persisted -> Done`, with `Failed` reachable from any stage.
//! Every valid query yields exactly one envelope or one request-level error.

mod core;
mod envelope;
pub mod metrics;

pub use self::core::{Stage, Supervisor, SupervisorConfig, DEFAULT_MAX_TURNS};
pub use envelope::{AttemptRecord, ResponseEnvelope, SESSION_SAVE_FAILED};
pub use metrics::CoreMetrics;
