pub mod extract;
pub mod fetcher;
pub mod relay_pool;

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::core::config::DEFAULT_RELAY_TIMEOUT_MS;
use crate::core::encoding::redact_url;
use crate::core::types::{GameConfig, GameSlug, InvalidSlug};

pub use extract::extract_config;
pub use fetcher::{AdBlockFetcher, FetchError, FetchedPage, Fetcher, ReqwestFetcher};
pub use relay_pool::{RelayEndpoint, RelayPool};

/// Why a single relay attempt did not yield a config. Never fatal: the
/// resolver moves on to the next relay.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptFailure {
    #[error("timed out")]
    Timeout,

    #[error("relay returned HTTP {0}")]
    HttpError(u16),

    #[error("response contained no embedded options")]
    NoConfigFound,

    #[error("embedded options are not valid JSON: {0}")]
    ParseError(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<FetchError> for AttemptFailure {
    fn from(e: FetchError) -> Self {
        AttemptFailure::Network(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayFailure {
    /// Zero-based position in the relay pool.
    pub relay: usize,
    pub failure: AttemptFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Success(GameConfig),
    /// Every relay failed; one entry per relay, in pool order.
    Exhausted(Vec<RelayFailure>),
}

impl ResolutionOutcome {
    pub fn config(&self) -> Option<&GameConfig> {
        match self {
            ResolutionOutcome::Success(config) => Some(config),
            ResolutionOutcome::Exhausted(_) => None,
        }
    }

    pub fn into_config(self) -> Option<GameConfig> {
        match self {
            ResolutionOutcome::Success(config) => Some(config),
            ResolutionOutcome::Exhausted(_) => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, ResolutionOutcome::Exhausted(_))
    }
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("relay pool must contain at least one relay")]
    EmptyRelayPool,

    #[error("template is missing its placeholder: {0}")]
    InvalidTemplate(String),

    #[error(transparent)]
    InvalidSlug(#[from] InvalidSlug),
}

/// Resolves a game slug to its embedded configuration by walking the relay
/// pool in order until one relay yields a parsable config.
///
/// Stateless between calls; share it behind an `Arc`.
pub struct ConfigResolver {
    fetcher: Arc<dyn Fetcher>,
    relays: RelayPool,
    target_template: String,
    timeout: Duration,
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("relays", &self.relays.len())
            .field("target_template", &self.target_template)
            .field("timeout_ms", &self.timeout.as_millis())
            .finish()
    }
}

impl ConfigResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, relays: RelayPool) -> Self {
        Self {
            fetcher,
            relays,
            target_template: relay_pool::DEFAULT_TARGET_TEMPLATE.to_string(),
            timeout: Duration::from_millis(DEFAULT_RELAY_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_target_template(
        mut self,
        template: impl Into<String>,
    ) -> Result<Self, ResolverError> {
        let template = template.into();
        relay_pool::check_target_template(&template)?;
        self.target_template = template;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn relays(&self) -> &RelayPool {
        &self.relays
    }

    /// The upstream page every relay is asked for.
    pub fn canonical_target(&self, slug: &GameSlug) -> String {
        relay_pool::canonical_target(&self.target_template, slug)
    }

    pub async fn resolve(&self, slug: &GameSlug) -> ResolutionOutcome {
        let target = self.canonical_target(slug);
        let mut failures = Vec::with_capacity(self.relays.len());

        for (i, relay) in self.relays.iter().enumerate() {
            let relay_url = relay.relay_url(&target);
            let shown = redact_url(&relay_url);
            info!("Fetching config for '{}' via relay {}: {}", slug, i + 1, shown);

            let started = Instant::now();
            match self.attempt(&relay_url).await {
                Ok(config) => {
                    info!(
                        "Resolved config for '{}' via relay {} in {}ms",
                        slug,
                        i + 1,
                        started.elapsed().as_millis()
                    );
                    return ResolutionOutcome::Success(config);
                }
                Err(failure) => {
                    warn!(
                        "Relay {} ({}) failed after {}ms: {}",
                        i + 1,
                        shown,
                        started.elapsed().as_millis(),
                        failure
                    );
                    failures.push(RelayFailure { relay: i, failure });
                }
            }
        }

        error!(
            "All {} relays failed to return a config for '{}'",
            self.relays.len(),
            slug
        );
        ResolutionOutcome::Exhausted(failures)
    }

    async fn attempt(&self, relay_url: &str) -> Result<GameConfig, AttemptFailure> {
        // Dropping the fetch future on timeout releases its connection.
        let page = tokio::time::timeout(self.timeout, self.fetcher.fetch_text(relay_url))
            .await
            .map_err(|_| AttemptFailure::Timeout)??;

        if !page.is_success() {
            return Err(AttemptFailure::HttpError(page.status));
        }

        extract_config(&page.body)
    }
}
