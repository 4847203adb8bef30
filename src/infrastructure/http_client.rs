//! HTTP client for portal crawling
//!
//! A thin reqwest wrapper carrying the fixed headers and per-request
//! timeout. Bodies are fetched as raw bytes and decoded here (the portal's
//! charset declaration cannot be trusted, see [`super::text`]), so callers
//! always receive usable text.
//!
//! Returns page bodies as `String` rather than parsed documents: parsed
//! HTML trees are not `Send`, and the worker pools parse inside the task
//! after the fetch completes.

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::domain::error::{CrawlError, CrawlResult};
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::text::decode_body;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &CrawlerConfig) -> CrawlResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .cookie_store(true)
            .build()
            .map_err(|source| CrawlError::Transport {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(Self { client })
    }

    /// Fetch one page and decode its body to text.
    ///
    /// Network failure, timeout, and non-success status are all
    /// [`CrawlError::Transport`] - fatal for the unit being processed,
    /// never for its batch.
    pub async fn fetch_page(&self, url: &str) -> CrawlResult<String> {
        debug!(url, "fetching page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|source| CrawlError::Transport {
                url: url.to_string(),
                source,
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|source| CrawlError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(decode_body(&bytes))
    }
}
