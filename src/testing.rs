//! Fakes for the upstream services and the cache.
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::{
    cache::{CacheError, CacheStore, InMemoryCacheStore},
    fetcher::{FlagFetcher, RuleFetcher},
    models::{Flag, RuleBody, TargetingRule},
    Error, Result, Service,
};

pub fn flag(name: &str, is_enabled: bool) -> Flag {
    Flag {
        name: name.to_owned(),
        is_enabled,
    }
}

pub fn percentage_rule(threshold: impl Into<serde_json::Value>) -> TargetingRule {
    TargetingRule {
        is_enabled: true,
        rules: RuleBody::percentage(threshold),
    }
}

pub fn not_found(resource: Service, name: &str) -> Error {
    Error::NotFound {
        resource,
        name: name.to_owned(),
    }
}

/// Serves one canned answer per service and counts requests.
pub struct FakeUpstream {
    flag: Result<Flag>,
    rule: Result<TargetingRule>,
    flag_delay: Duration,
    rule_delay: Duration,
    /// When set, both fetches wait on it before answering, so they only complete if they run
    /// concurrently.
    barrier: Option<Arc<Barrier>>,
    flag_calls: AtomicUsize,
    rule_calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn new(flag: Result<Flag>, rule: Result<TargetingRule>) -> FakeUpstream {
        FakeUpstream {
            flag,
            rule,
            flag_delay: Duration::ZERO,
            rule_delay: Duration::ZERO,
            barrier: None,
            flag_calls: AtomicUsize::new(0),
            rule_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_flag_delay(mut self, delay: Duration) -> FakeUpstream {
        self.flag_delay = delay;
        self
    }

    pub fn with_rule_delay(mut self, delay: Duration) -> FakeUpstream {
        self.rule_delay = delay;
        self
    }

    pub fn with_rendezvous(mut self) -> FakeUpstream {
        self.barrier = Some(Arc::new(Barrier::new(2)));
        self
    }

    pub fn flag_calls(&self) -> usize {
        self.flag_calls.load(Ordering::SeqCst)
    }

    pub fn rule_calls(&self) -> usize {
        self.rule_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self, delay: Duration) {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl FlagFetcher for FakeUpstream {
    async fn fetch_flag(&self, _name: &str) -> Result<Flag> {
        self.flag_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(self.flag_delay).await;
        self.flag.clone()
    }
}

#[async_trait]
impl RuleFetcher for FakeUpstream {
    async fn fetch_rule(&self, _name: &str) -> Result<TargetingRule> {
        self.rule_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(self.rule_delay).await;
        self.rule.clone()
    }
}

/// A recorded [`CacheStore::set`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheWrite {
    pub key: String,
    pub value: String,
    pub ttl: Duration,
}

/// In-memory cache that records writes and can be told to fail.
#[derive(Default)]
pub struct RecordingCache {
    inner: InMemoryCacheStore,
    writes: Mutex<Vec<CacheWrite>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl RecordingCache {
    pub fn new() -> RecordingCache {
        RecordingCache::default()
    }

    pub fn failing_reads() -> RecordingCache {
        RecordingCache {
            fail_reads: true,
            ..RecordingCache::default()
        }
    }

    pub fn failing_writes() -> RecordingCache {
        RecordingCache {
            fail_writes: true,
            ..RecordingCache::default()
        }
    }

    /// Store `value` without recording it as a write.
    pub async fn seed(&self, key: &str, value: &str) {
        self.inner
            .set(key, value, Duration::from_secs(60))
            .await
            .unwrap();
    }

    pub fn writes(&self) -> Vec<CacheWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
        if self.fail_reads {
            return Err(CacheError::Connection("connection refused".to_owned()));
        }
        self.inner.get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        self.writes.lock().unwrap().push(CacheWrite {
            key: key.to_owned(),
            value: value.to_owned(),
            ttl,
        });
        if self.fail_writes {
            return Err(CacheError::Connection("connection refused".to_owned()));
        }
        self.inner.set(key, value, ttl).await
    }
}
