//! Cache-aside resolution of [`CombinedFlagInfo`].
//!
//! [`CombinedInfoResolver`] looks the flag up in the cache first. On a miss it fetches the flag
//! definition and the targeting rule concurrently, combines them and writes the result back to
//! the cache on a best-effort basis.
use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    cache::{CacheError, CacheStore},
    fetcher::{FlagFetcher, RuleFetcher},
    models::CombinedFlagInfo,
    Error, Result, Service,
};

const CACHE_KEY_PREFIX: &str = "flag_info:";

/// Cache key under which combined information for `flag_name` is stored.
pub fn cache_key(flag_name: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{flag_name}")
}

/// Configuration for [`CombinedInfoResolver`].
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Expiry of entries written to the cache.
    pub cache_ttl: Duration,
    /// Deadline for each upstream request.
    pub fetch_timeout: Duration,
}

impl ResolverConfig {
    /// Default expiry of cached flag information.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
    /// Default deadline for a single upstream request.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
}

impl Default for ResolverConfig {
    fn default() -> ResolverConfig {
        ResolverConfig {
            cache_ttl: ResolverConfig::DEFAULT_CACHE_TTL,
            fetch_timeout: ResolverConfig::DEFAULT_FETCH_TIMEOUT,
        }
    }
}

pub struct CombinedInfoResolver {
    flags: Arc<dyn FlagFetcher>,
    rules: Arc<dyn RuleFetcher>,
    cache: Arc<dyn CacheStore>,
    config: ResolverConfig,
}

impl CombinedInfoResolver {
    pub fn new(
        flags: Arc<dyn FlagFetcher>,
        rules: Arc<dyn RuleFetcher>,
        cache: Arc<dyn CacheStore>,
    ) -> CombinedInfoResolver {
        CombinedInfoResolver {
            flags,
            rules,
            cache,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> CombinedInfoResolver {
        self.config = config;
        self
    }

    /// Resolve the flag definition and its targeting rule.
    ///
    /// # Errors
    ///
    /// Only a failure to resolve the flag itself is returned. A missing or unavailable targeting
    /// rule yields `rule: None`, and cache failures are logged and ignored.
    pub async fn get_combined_info(&self, flag_name: &str) -> Result<CombinedFlagInfo> {
        let key = cache_key(flag_name);

        if let Some(info) = self.read_cache(&key, flag_name).await {
            log::debug!(target: "toggle", flag_name; "cache hit");
            return Ok(info);
        }

        log::debug!(target: "toggle", flag_name; "cache miss");
        let info = self.fetch_from_services(flag_name).await?;
        self.write_cache(&key, &info).await;

        Ok(info)
    }

    async fn read_cache(&self, key: &str, flag_name: &str) -> Option<CombinedFlagInfo> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                log::warn!(target: "toggle", flag_name; "failed to read from cache: {}", err);
                return None;
            }
        };

        // A corrupted entry is refetched and overwritten.
        serde_json::from_str(&raw)
            .inspect_err(|err| {
                log::warn!(target: "toggle", flag_name; "failed to decode cached flag info: {}", err);
            })
            .ok()
    }

    async fn fetch_from_services(&self, flag_name: &str) -> Result<CombinedFlagInfo> {
        let timeout = self.config.fetch_timeout;

        // Each future owns its result; both are driven to completion before either is inspected.
        let (flag, rule) = tokio::join!(
            with_timeout(Service::Flags, timeout, self.flags.fetch_flag(flag_name)),
            with_timeout(Service::Targeting, timeout, self.rules.fetch_rule(flag_name)),
        );

        let flag = flag?;

        let rule = match rule {
            Ok(rule) => Some(rule),
            Err(err) if err.is_not_found() => {
                log::debug!(target: "toggle", flag_name; "no targeting rule configured");
                None
            }
            Err(err) => {
                log::warn!(target: "toggle", flag_name; "targeting rule unavailable, evaluating without targeting: {}", err);
                None
            }
        };

        Ok(CombinedFlagInfo { flag, rule })
    }

    async fn write_cache(&self, key: &str, info: &CombinedFlagInfo) {
        let result = match serde_json::to_string(info) {
            Ok(value) => self.cache.set(key, &value, self.config.cache_ttl).await,
            Err(err) => Err(CacheError::from(err)),
        };

        if let Err(err) = result {
            log::warn!(target: "toggle", flag_name:display = info.flag.name; "failed to write to cache: {}", err);
        }
    }
}

async fn with_timeout<T>(
    service: Service,
    after: Duration,
    fetch: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, fetch)
        .await
        .map_err(|_| Error::Timeout { service, after })?
}
