use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisError};

use super::{CacheError, CacheStore};

/// Redis-backed [`CacheStore`].
///
/// Uses a multiplexed connection, so clones share one connection and are cheap to hand out.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: MultiplexedConnection,
}

impl RedisCacheStore {
    /// Connect to Redis at `url` (e.g., "redis://127.0.0.1:6379").
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(map_redis_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;
        Ok(RedisCacheStore { conn })
    }

    /// Create a store from an existing multiplexed connection.
    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        RedisCacheStore { conn }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let Some(millis) = expiry_millis(ttl) else {
            log::debug!(target: "toggle", cache_key = key; "zero cache ttl, skipping write");
            return Ok(());
        };

        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(key, value, millis)
            .await
            .map_err(map_redis_error)
    }
}

/// `PSETEX` expiry for `ttl`. Sub-millisecond TTLs round up to 1 ms; `None` for a zero TTL, which
/// `PSETEX` rejects.
fn expiry_millis(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        return None;
    }
    Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1))
}

fn map_redis_error(err: RedisError) -> CacheError {
    CacheError::Connection(err.to_string())
}
