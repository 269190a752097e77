//! Key-value cache consumed by the resolver. The cache is an optimization only: every failure
//! reported through [`CacheError`] is absorbed by the caller.
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

#[cfg(feature = "redis")]
mod redis_store;

#[cfg(feature = "redis")]
pub use redis_store::RedisCacheStore;

/// Errors reported by a [`CacheStore`].
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The backing store could not be reached.
    #[error("cache connection error: {0}")]
    Connection(String),

    /// A value could not be encoded for storage.
    #[error("cache serialization error")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value store with per-entry expiry.
///
/// Implementations must be safe for concurrent use by many in-flight evaluations.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns `Ok(None)` on a miss or for an expired entry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

struct Entry {
    value: String,
    /// `None` when the expiry is too far out to be represented, i.e., never.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// Process-local [`CacheStore`].
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        InMemoryCacheStore::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        // Constructing new entry before requesting the lock to minimize lock span.
        let entry = Entry {
            value: value.to_owned(),
            expires_at: Instant::now().checked_add(ttl),
        };

        let mut entries = self.entries.write().await;
        // Expired entries are only dropped on write, reads skip them.
        let now = Instant::now();
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(key.to_owned(), entry);
        Ok(())
    }
}
