//! Session state and its pluggable stores
//!
//! The supervisor loads a session at the start of a query, mutates it, and
//! saves it once the answer is known. Store failures never fail the query.

mod redis_store;
mod store;
mod types;

pub use redis_store::RedisStore;
pub use store::{MemoryStore, SessionStore};
pub use types::{summarize, Session, Turn, SUMMARY_CHARS};

#[cfg(test)]
pub use store::MockSessionStore;
