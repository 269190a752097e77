use std::{fmt, sync::Arc, time::Duration};

use crate::{
    cache::CacheStore,
    fetcher::{HttpFetcher, HttpFetcherConfig},
    resolver::{CombinedInfoResolver, ResolverConfig},
    Evaluator, Result,
};

/// Environment variable holding the flag service base URL.
pub const FLAG_SERVICE_URL_VAR: &str = "FLAG_SERVICE_URL";
/// Environment variable holding the targeting service base URL.
pub const TARGETING_SERVICE_URL_VAR: &str = "TARGETING_SERVICE_URL";
/// Environment variable holding the bearer credential for both services.
pub const SERVICE_API_KEY_VAR: &str = "SERVICE_API_KEY";
/// Optional environment variable overriding [`EvaluatorConfig::DEFAULT_CACHE_TTL`].
pub const CACHE_TTL_SECONDS_VAR: &str = "CACHE_TTL_SECONDS";
/// Optional environment variable overriding [`EvaluatorConfig::DEFAULT_FETCH_TIMEOUT`].
pub const FETCH_TIMEOUT_MS_VAR: &str = "FETCH_TIMEOUT_MS";

/// Errors reading [`EvaluatorConfig`] from the environment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Configuration for [`Evaluator`].
#[derive(Clone)]
pub struct EvaluatorConfig {
    pub(crate) api_key: String,
    pub(crate) flag_service_url: String,
    pub(crate) targeting_service_url: String,
    pub(crate) cache_ttl: Duration,
    pub(crate) fetch_timeout: Duration,
    pub(crate) http_client: Option<reqwest::Client>,
}

impl EvaluatorConfig {
    /// Default expiry of cached flag information.
    pub const DEFAULT_CACHE_TTL: Duration = ResolverConfig::DEFAULT_CACHE_TTL;
    /// Default deadline for a single upstream request.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = ResolverConfig::DEFAULT_FETCH_TIMEOUT;

    /// Create a configuration with default cache and timeout settings.
    ///
    /// ```
    /// # use toggle_evaluation::EvaluatorConfig;
    /// EvaluatorConfig::new("api-key", "http://flag-service:8002", "http://targeting-service:8003");
    /// ```
    pub fn new(
        api_key: impl Into<String>,
        flag_service_url: impl Into<String>,
        targeting_service_url: impl Into<String>,
    ) -> EvaluatorConfig {
        EvaluatorConfig {
            api_key: api_key.into(),
            flag_service_url: flag_service_url.into(),
            targeting_service_url: targeting_service_url.into(),
            cache_ttl: EvaluatorConfig::DEFAULT_CACHE_TTL,
            fetch_timeout: EvaluatorConfig::DEFAULT_FETCH_TIMEOUT,
            http_client: None,
        }
    }

    /// Read configuration from process environment.
    ///
    /// `FLAG_SERVICE_URL`, `TARGETING_SERVICE_URL` and `SERVICE_API_KEY` are required.
    /// `CACHE_TTL_SECONDS` and `FETCH_TIMEOUT_MS` are optional.
    pub fn from_env() -> std::result::Result<EvaluatorConfig, ConfigError> {
        EvaluatorConfig::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<EvaluatorConfig, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional_u64 = |name: &'static str| match lookup(name) {
            None => Ok(None),
            Some(value) => value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ConfigError::Invalid { name, value }),
        };

        let mut config = EvaluatorConfig::new(
            required(SERVICE_API_KEY_VAR)?,
            required(FLAG_SERVICE_URL_VAR)?,
            required(TARGETING_SERVICE_URL_VAR)?,
        );
        if let Some(seconds) = optional_u64(CACHE_TTL_SECONDS_VAR)? {
            config.cache_ttl = Duration::from_secs(seconds);
        }
        if let Some(millis) = optional_u64(FETCH_TIMEOUT_MS_VAR)? {
            config.fetch_timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }

    /// Override expiry of cached flag information.
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> EvaluatorConfig {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Override the deadline applied to each upstream request.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> EvaluatorConfig {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Use an existing HTTP client, sharing its connection pool. A new client is created
    /// otherwise.
    pub fn with_http_client(mut self, client: reqwest::Client) -> EvaluatorConfig {
        self.http_client = Some(client);
        self
    }

    /// Create a new [`Evaluator`] that talks to upstream services over HTTP and caches flag
    /// information in `cache`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`](crate::Error::InvalidBaseUrl) if one of the service
    /// URLs cannot be parsed.
    pub fn to_evaluator(self, cache: Arc<dyn CacheStore>) -> Result<Evaluator> {
        let fetcher = Arc::new(HttpFetcher::new(
            self.http_client.unwrap_or_default(),
            HttpFetcherConfig {
                flag_service_url: self.flag_service_url,
                targeting_service_url: self.targeting_service_url,
                api_key: self.api_key,
            },
        )?);

        let resolver = CombinedInfoResolver::new(fetcher.clone(), fetcher, cache).with_config(
            ResolverConfig {
                cache_ttl: self.cache_ttl,
                fetch_timeout: self.fetch_timeout,
            },
        );

        Ok(Evaluator::new(resolver))
    }
}

impl fmt::Debug for EvaluatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // api_key is left out on purpose.
        f.debug_struct("EvaluatorConfig")
            .field("flag_service_url", &self.flag_service_url)
            .field("targeting_service_url", &self.targeting_service_url)
            .field("cache_ttl", &self.cache_ttl)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}
