//! Session storage backends
//!
//! `MemoryStore` keeps sessions in process and loses them on restart; use
//! `RedisStore` when more than one replica serves the same sessions.
//! Neither backend serializes concurrent turns on one session: the last
//! `save` wins.

use super::Session;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Session store abstraction used by the supervisor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session, `None` if it does not exist
    async fn load(&self, session_id: &str) -> Result<Option<Session>>;

    /// Save (create or overwrite) a session
    async fn save(&self, session: &Session) -> Result<()>;

    /// Delete a session, returns whether it existed
    async fn delete(&self, session_id: &str) -> Result<bool>;

    /// Drop expired sessions, returns how many were removed
    async fn cleanup_expired(&self) -> Result<usize>;

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// In-process session store with TTL-based cleanup
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(24 * 3600))
    }
}

impl MemoryStore {
    /// Create a store whose sessions expire `ttl` after their last activity
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        info!(ttl_secs = ttl.as_secs(), "Initializing MemoryStore for session storage");
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Number of stored sessions, expired ones included until cleanup
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn is_expired(&self, session: &Session) -> bool {
        let age = Utc::now().signed_duration_since(session.last_activity);
        age.to_std().is_ok_and(|age| age > self.ttl)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|s| !self.is_expired(s))
            .cloned())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(session_id).is_some())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session));
        let removed = before - sessions.len();

        if removed > 0 {
            debug!(
                removed,
                remaining = sessions.len(),
                "Cleaned up expired sessions"
            );
        }
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
