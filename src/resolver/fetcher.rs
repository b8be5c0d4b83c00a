use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::features::antibot;
use crate::features::ad_filter::AdFilter;

/// Status and text body of a fetched page.
///
/// `body` is only read for 2xx responses; error pages come back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

/// Outbound GET seam. The resolver only talks to relays through this trait,
/// so request policy (filtering, headers) composes as decorators.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_text(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", antibot::get_random_user_agent())
            .header("Accept", "text/html,application/xhtml+xml,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Ok(FetchedPage {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;
        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}

/// Answers blocklisted URLs locally with an empty `{}` 200 and forwards the rest.
pub struct AdBlockFetcher<F> {
    inner: F,
    filter: AdFilter,
}

impl<F: Fetcher> AdBlockFetcher<F> {
    pub fn new(inner: F, filter: AdFilter) -> Self {
        Self { inner, filter }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for AdBlockFetcher<F> {
    async fn fetch_text(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if self.filter.is_blocked(url) {
            warn!("Intercepted ad request: {}", crate::core::encoding::redact_url(url));
            return Ok(FetchedPage {
                status: 200,
                body: "{}".to_string(),
            });
        }
        debug!("ad filter pass-through");
        self.inner.fetch_text(url).await
    }
}
