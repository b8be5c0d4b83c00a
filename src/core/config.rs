use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::relay_pool::{RelayEndpoint, RelayPool, DEFAULT_TARGET_TEMPLATE};
use crate::resolver::ResolverError;

// ---------------------------------------------------------------------------
// SaneConfig: file-based config loader (sanegames.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "SANEGAMES_CONFIG";
pub const ENV_RELAY_TIMEOUT_MS: &str = "SANEGAMES_RELAY_TIMEOUT_MS";
pub const ENV_TARGET_TEMPLATE: &str = "SANEGAMES_TARGET_TEMPLATE";
pub const ENV_RELAY_PUBLIC_URL: &str = "SANEGAMES_RELAY_PUBLIC_URL";
pub const ENV_RELAY_USER_AGENT: &str = "SANEGAMES_RELAY_USER_AGENT";
pub const ENV_AD_FILTER: &str = "SANEGAMES_AD_FILTER";

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_RELAY_TIMEOUT_MS: u64 = 5_000;
pub const MIN_RELAY_TIMEOUT_MS: u64 = 100;

/// One relay entry as written in `sanegames.json`.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct RelayEndpointConfig {
    /// URL template containing a `{target}` placeholder.
    pub template: String,
    /// Percent-encode the target before substitution. Defaults to `true`.
    #[serde(default = "default_true")]
    pub encode_target: bool,
}

fn default_true() -> bool {
    true
}

/// Resolver sub-config (mirrors the `resolver` key in sanegames.json).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct ResolverSection {
    /// Ordered relay pool. First entry is tried first.
    pub relays: Option<Vec<RelayEndpointConfig>>,
    /// Per-relay attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Canonical game page template containing a `{slug}` placeholder.
    pub target_template: Option<String>,
}

impl ResolverSection {
    /// Relay pool: JSON field → built-in pool.
    ///
    /// An explicitly empty list is an error, not a silent fallback.
    pub fn resolve_relay_pool(&self) -> Result<RelayPool, ResolverError> {
        match &self.relays {
            Some(entries) => RelayPool::new(
                entries
                    .iter()
                    .map(|e| RelayEndpoint::new(e.template.clone(), e.encode_target))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => Ok(RelayPool::default()),
        }
    }

    /// Attempt timeout: JSON field → `SANEGAMES_RELAY_TIMEOUT_MS` → 5000ms, floored at 100ms.
    pub fn resolve_timeout(&self) -> Duration {
        let ms = self
            .timeout_ms
            .or_else(|| env_parse::<u64>(ENV_RELAY_TIMEOUT_MS))
            .unwrap_or(DEFAULT_RELAY_TIMEOUT_MS);
        Duration::from_millis(ms.max(MIN_RELAY_TIMEOUT_MS))
    }

    /// Target template: JSON field → `SANEGAMES_TARGET_TEMPLATE` → crazygames en_US page.
    pub fn resolve_target_template(&self) -> String {
        non_blank(self.target_template.as_deref())
            .or_else(|| env_non_blank(ENV_TARGET_TEMPLATE))
            .unwrap_or_else(|| DEFAULT_TARGET_TEMPLATE.to_string())
    }
}

/// Relay (proxy-game endpoint) sub-config.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct RelaySection {
    /// Publicly reachable URL of this server's relay endpoint, used when
    /// rewriting game URLs for the browser.
    pub public_url: Option<String>,
    /// User-Agent sent upstream when the caller did not provide one.
    pub default_user_agent: Option<String>,
}

impl RelaySection {
    /// Public URL: JSON field → `SANEGAMES_RELAY_PUBLIC_URL` → `http://localhost:<port>/proxy-game`.
    pub fn resolve_public_url(&self, port: u16) -> String {
        non_blank(self.public_url.as_deref())
            .or_else(|| env_non_blank(ENV_RELAY_PUBLIC_URL))
            .unwrap_or_else(|| format!("http://localhost:{}/proxy-game", port))
    }

    /// Fallback UA: JSON field → `SANEGAMES_RELAY_USER_AGENT` → `SaneGames-Proxy/1.0`.
    pub fn resolve_default_user_agent(&self) -> String {
        non_blank(self.default_user_agent.as_deref())
            .or_else(|| env_non_blank(ENV_RELAY_USER_AGENT))
            .unwrap_or_else(|| "SaneGames-Proxy/1.0".to_string())
    }
}

/// Outbound request filter sub-config.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct FilterSection {
    pub enabled: Option<bool>,
    /// Replaces the built-in ad domain list when set.
    pub ad_domains: Option<Vec<String>>,
}

impl FilterSection {
    /// JSON field → `SANEGAMES_AD_FILTER` (`0`/`false`/`off` disables) → enabled.
    pub fn resolve_enabled(&self) -> bool {
        if let Some(b) = self.enabled {
            return b;
        }
        let Ok(v) = std::env::var(ENV_AD_FILTER) else {
            return true;
        };
        let v = v.trim().to_ascii_lowercase();
        !matches!(v.as_str(), "0" | "false" | "no" | "off" | "disabled")
    }
}

/// Top-level config loaded from `sanegames.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct SaneConfig {
    #[serde(default)]
    pub resolver: ResolverSection,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub filter: FilterSection,
}

/// Load `sanegames.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `SANEGAMES_CONFIG` env var path
/// 2. `./sanegames.json`
/// 3. `../sanegames.json`
/// 4. `~/.sanegames/sanegames.json`
///
/// Missing file → `SaneConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `SaneConfig::default()`.
pub fn load_sane_config() -> SaneConfig {
    for path in &config_candidates() {
        let Ok(contents) = std::fs::read_to_string(path) else {
            continue;
        };
        return match parse_sane_config(&contents) {
            Ok(cfg) => {
                tracing::info!("sanegames.json loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    "sanegames.json parse error at {}: {}; using defaults",
                    path.display(),
                    e
                );
                SaneConfig::default()
            }
        };
    }

    SaneConfig::default()
}

pub fn parse_sane_config(contents: &str) -> Result<SaneConfig, serde_json::Error> {
    serde_json::from_str(contents)
}

fn config_candidates() -> Vec<PathBuf> {
    let mut v = vec![
        PathBuf::from("sanegames.json"),
        PathBuf::from("../sanegames.json"),
    ];
    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        v.insert(0, PathBuf::from(env_path));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".sanegames").join("sanegames.json"));
    }
    v
}

/// Outbound HTTP client timeouts: `HTTP_TIMEOUT_SECS` (30) and `HTTP_CONNECT_TIMEOUT_SECS` (10).
pub fn http_timeouts() -> (Duration, Duration) {
    let total = env_parse::<u64>("HTTP_TIMEOUT_SECS").unwrap_or(30);
    let connect = env_parse::<u64>("HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(10);
    (Duration::from_secs(total), Duration::from_secs(connect))
}

/// Max concurrent relay fetches: `OUTBOUND_LIMIT` → 32.
pub fn outbound_limit() -> usize {
    env_parse::<usize>("OUTBOUND_LIMIT").unwrap_or(32).max(1)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_non_blank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
