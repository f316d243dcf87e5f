// HTTP fetcher backed by reqwest.
// Resolves relative locators against the shell origin and captures full responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use url::Url;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::platform::{Fetcher, Request, Response};

/// Network fetcher used by the CLI host.
pub struct HttpFetcher {
    client: Client,
    origin: Url,
}

impl HttpFetcher {
    /// Create a fetcher for the given origin and timeout.
    pub fn new(origin: Url, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("offline-shell/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(AgentError::Http)?;

        Ok(Self { client, origin })
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        Self::new(
            config.origin_url()?,
            Duration::from_secs(config.fetch_timeout_secs),
        )
    }

    /// Absolute URL for a request, resolving relative paths against the origin.
    fn resolve(&self, url: &str) -> Result<Url> {
        Ok(self.origin.join(url)?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let url = self.resolve(&request.url)?;
        tracing::debug!(method = %request.method, url = %url, "Fetching from network");

        let response = self
            .client
            .request(request.method.clone(), url)
            .send()
            .await
            .map_err(AgentError::Http)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            url: final_url,
            status,
            headers,
            body,
        })
    }
}
