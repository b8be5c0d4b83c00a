use std::sync::Arc;

use crate::core::config::{self, SaneConfig};
use crate::core::types::GameSummary;
use crate::features::ad_filter::AdFilter;
use crate::relay::ProxyRelay;
use crate::resolver::{AdBlockFetcher, ConfigResolver, Fetcher, ReqwestFetcher, ResolverError};

#[derive(Clone)]
pub struct AppState {
    pub http_client: reqwest::Client,
    pub resolver: Arc<ConfigResolver>,
    pub relay: Arc<ProxyRelay>,
    // key: lowercased query
    pub search_cache: moka::future::Cache<String, Vec<GameSummary>>,
    // Concurrency control for relayed fetches
    pub outbound_limit: Arc<tokio::sync::Semaphore>,
    /// Public URL of our own relay endpoint, baked into launch plans.
    pub relay_public_url: String,
    pub config: Arc<SaneConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("resolver", &self.resolver)
            .field("relay_public_url", &self.relay_public_url)
            .finish()
    }
}

impl AppState {
    pub fn new(http_client: reqwest::Client, config: SaneConfig) -> Result<Self, ResolverError> {
        let resolver = build_resolver(&http_client, &config)?;
        let relay = ProxyRelay::new(
            http_client.clone(),
            config.relay.resolve_default_user_agent(),
        );

        Ok(Self {
            relay_public_url: config.relay.resolve_public_url(config::DEFAULT_PORT),
            resolver: Arc::new(resolver),
            relay: Arc::new(relay),
            search_cache: moka::future::Cache::builder()
                .max_capacity(1_000)
                .time_to_live(std::time::Duration::from_secs(60 * 10))
                .build(),
            outbound_limit: Arc::new(tokio::sync::Semaphore::new(config::outbound_limit())),
            config: Arc::new(config),
            http_client,
        })
    }

    pub fn with_resolver(mut self, resolver: Arc<ConfigResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_relay_public_url(mut self, url: impl Into<String>) -> Self {
        self.relay_public_url = url.into();
        self
    }
}

/// Wire the resolver from config: reqwest fetcher, optionally behind the ad filter.
pub fn build_resolver(
    http_client: &reqwest::Client,
    config: &SaneConfig,
) -> Result<ConfigResolver, ResolverError> {
    let base = ReqwestFetcher::new(http_client.clone());
    let fetcher: Arc<dyn Fetcher> = if config.filter.resolve_enabled() {
        let filter = match &config.filter.ad_domains {
            Some(domains) => AdFilter::new(domains.as_slice()).unwrap_or_else(|e| {
                tracing::warn!("Invalid ad domain list ({}); using built-in list", e);
                AdFilter::default()
            }),
            None => AdFilter::default(),
        };
        Arc::new(AdBlockFetcher::new(base, filter))
    } else {
        Arc::new(base)
    };

    ConfigResolver::new(fetcher, config.resolver.resolve_relay_pool()?)
        .with_timeout(config.resolver.resolve_timeout())
        .with_target_template(config.resolver.resolve_target_template())
}
