use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Reason a fetch produced nothing. Only ever logged; callers see `None`.
#[derive(Debug, Error)]
enum FetchError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    StatusError(reqwest::StatusCode),
}

/// Outbound GET for text and JSON payloads.
///
/// Any network, status or decoding failure collapses to `None`. One request
/// per call, no retries.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Option<String>;
    async fn fetch_json(&self, url: &str, timeout: Duration) -> Option<Value>;
}

pub struct HttpFetcher {
    client: Client,
    github_api_base: String,
    github_token: Option<String>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            github_api_base: String::new(),
            github_token: None,
        }
    }

    /// Sends `token` as a bearer credential on requests under `api_base`.
    pub fn with_github_token(api_base: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            github_api_base: api_base.to_string(),
            github_token: token,
        }
    }

    async fn get(&self, url: &str, timeout: Duration, accept: &str) -> Result<reqwest::Response, FetchError> {
        let mut request = self.client.get(url)
            .header("Accept", accept)
            .header("User-Agent", concat!("langchain-docs-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout);

        if let Some(token) = &self.github_token {
            if !self.github_api_base.is_empty() && url.starts_with(&self.github_api_base) {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::StatusError(response.status()));
        }
        Ok(response)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Option<String> {
        tracing::debug!("Fetching {}", url);
        let result = match self.get(url, timeout, "text/html, text/plain, */*").await {
            Ok(response) => response.text().await.map_err(FetchError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", url, e);
                None
            }
        }
    }

    async fn fetch_json(&self, url: &str, timeout: Duration) -> Option<Value> {
        tracing::debug!("Fetching JSON from {}", url);
        let result = match self.get(url, timeout, "application/json").await {
            Ok(response) => response.json::<Value>().await.map_err(FetchError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Error fetching JSON from {}: {}", url, e);
                None
            }
        }
    }
}
