//! Clients for the two upstream services: the flag service and the targeting service.
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{
    models::{Flag, TargetingRule},
    Error, Result, Service,
};

const FLAGS_ENDPOINT: &str = "flags";
const RULES_ENDPOINT: &str = "rules";

/// Fetches flag definitions by name.
#[async_trait]
pub trait FlagFetcher: Send + Sync {
    /// Returns [`Error::NotFound`] if the flag does not exist.
    async fn fetch_flag(&self, name: &str) -> Result<Flag>;
}

/// Fetches targeting rules by flag name.
#[async_trait]
pub trait RuleFetcher: Send + Sync {
    /// Returns [`Error::NotFound`] if no rule is configured for the flag.
    async fn fetch_rule(&self, name: &str) -> Result<TargetingRule>;
}

pub struct HttpFetcherConfig {
    pub flag_service_url: String,
    pub targeting_service_url: String,
    /// Bearer credential sent to both services.
    pub api_key: String,
}

/// HTTP client for both upstream services.
pub struct HttpFetcher {
    // Client holds a connection pool internally, so it should be shared with the rest of the
    // process.
    client: reqwest::Client,
    flag_service_url: Url,
    targeting_service_url: Url,
    api_key: String,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, config: HttpFetcherConfig) -> Result<HttpFetcher> {
        Ok(HttpFetcher {
            client,
            flag_service_url: parse_base_url(&config.flag_service_url)?,
            targeting_service_url: parse_base_url(&config.targeting_service_url)?,
            api_key: config.api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: Service,
        url: Url,
        name: &str,
    ) -> Result<T> {
        log::debug!(target: "toggle", service:display = service, name; "fetching from upstream");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(Error::NotFound {
                    resource: service,
                    name: name.to_owned(),
                });
            }
            StatusCode::UNAUTHORIZED => {
                log::warn!(target: "toggle", service:display = service; "request is not authorized. Check your API key");
                return Err(Error::Unauthorized { service });
            }
            status => {
                log::warn!(target: "toggle", service:display = service, name; "received non-200 response: {:?}", status);
                return Err(Error::UnexpectedStatus {
                    service,
                    status: status.as_u16(),
                });
            }
        }

        // Decoding from bytes so that a malformed payload is reported as a decode error rather
        // than a network one.
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl FlagFetcher for HttpFetcher {
    async fn fetch_flag(&self, name: &str) -> Result<Flag> {
        let url = endpoint(&self.flag_service_url, FLAGS_ENDPOINT, name)?;
        self.get_json(Service::Flags, url, name).await
    }
}

#[async_trait]
impl RuleFetcher for HttpFetcher {
    async fn fetch_rule(&self, name: &str) -> Result<TargetingRule> {
        let url = endpoint(&self.targeting_service_url, RULES_ENDPOINT, name)?;
        self.get_json(Service::Targeting, url, name).await
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url).map_err(Error::InvalidBaseUrl)?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidBaseUrl(
            url::ParseError::RelativeUrlWithCannotBeABaseBase,
        ));
    }
    Ok(url)
}

/// `{base}/{collection}/{name}` with `name` percent-encoded as a single path segment.
fn endpoint(base: &Url, collection: &str, name: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidBaseUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .push(collection)
        .push(name);
    Ok(url)
}
