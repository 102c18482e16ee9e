use super::{Session, SessionStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::debug;

/// Redis-backed session store
///
/// Sessions are stored as JSON under `<prefix><session_id>` with `SETEX`, so
/// expiry is handled by Redis.
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
    ttl_seconds: u64,
}

impl RedisStore {
    /// Default key prefix
    pub const DEFAULT_PREFIX: &'static str = "switchyard:session:";

    /// Create a store with the default prefix and a 24 hour TTL
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self> {
        Self::with_options(redis_url, Self::DEFAULT_PREFIX, 24 * 3600)
    }

    /// Create with custom prefix and TTL
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn with_options(redis_url: &str, prefix: &str, ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Configuration(format!("invalid redis url: {e}")))?;

        Ok(Self {
            client,
            prefix: prefix.to_string(),
            ttl_seconds,
        })
    }

    fn build_key(&self, session_id: &str) -> String {
        format!("{}{}", self.prefix, session_id)
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::SessionStore(format!("Redis connection failed: {e}")))
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(session_id);

        let data: Option<String> = redis::cmd("GET").arg(&key).query_async(&mut conn).await?;

        match data {
            Some(json) => {
                let session: Session = serde_json::from_str(&json).map_err(|e| {
                    Error::SessionStore(format!("Failed to deserialize session: {e}"))
                })?;
                debug!(session_id = %session_id, "Session loaded from Redis");
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(&session.session_id);
        let json = serde_json::to_string(session)?;

        redis::cmd("SETEX")
            .arg(&key)
            .arg(self.ttl_seconds)
            .arg(&json)
            .query_async::<()>(&mut conn)
            .await?;

        debug!(
            session_id = %session.session_id,
            ttl = self.ttl_seconds,
            "Session saved to Redis"
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let key = self.build_key(session_id);

        let deleted: i64 = redis::cmd("DEL").arg(&key).query_async(&mut conn).await?;
        Ok(deleted > 0)
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        // SETEX already expires keys
        Ok(0)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
