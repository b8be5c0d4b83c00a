use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::types::GameSummary;
use crate::AppState;

const SEARCH_ENDPOINT: &str = "https://api.crazygames.com/v4/en_US/search";
const COVER_BASE: &str = "https://imgs.crazygames.com/";
const MAX_RESULTS: &str = "100";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search API returned HTTP {0}")]
    Status(u16),

    #[error("unexpected search payload: {0}")]
    Payload(String),
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    result: Vec<SearchRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRecord {
    #[serde(default)]
    record_type: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cover: Option<String>,
}

pub fn search_url(query: &str) -> Result<reqwest::Url, SearchError> {
    let mut url =
        reqwest::Url::parse(SEARCH_ENDPOINT).map_err(|e| SearchError::Request(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("limit", MAX_RESULTS)
        .append_pair("device", "desktop")
        .append_pair("includeTopGames", "true");
    Ok(url)
}

/// Keep game records only; people, tags and collections share the same list.
pub fn parse_results(body: &str) -> Result<Vec<GameSummary>, SearchError> {
    let payload: SearchPayload =
        serde_json::from_str(body).map_err(|e| SearchError::Payload(e.to_string()))?;

    Ok(payload
        .result
        .into_iter()
        .filter(|r| r.record_type.as_deref() == Some("game"))
        .filter_map(|r| {
            let slug = r.slug.filter(|s| !s.trim().is_empty())?;
            Some(GameSummary {
                cover_url: format!("{}{}", COVER_BASE, r.cover.unwrap_or_default()),
                play_path: format!(
                    "play.html?game={}",
                    crate::core::encoding::encode_component(&slug)
                ),
                name: r.name,
                slug,
            })
        })
        .collect())
}

pub async fn search_games(
    client: &reqwest::Client,
    query: &str,
) -> Result<Vec<GameSummary>, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let resp = client
        .get(search_url(query)?)
        .header("User-Agent", crate::features::antibot::get_random_user_agent())
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| SearchError::Request(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SearchError::Status(status.as_u16()));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| SearchError::Request(e.to_string()))?;
    parse_results(&body)
}

/// `search_games` behind the shared result cache (keyed by lowercased query).
pub async fn search_games_cached(
    state: &AppState,
    query: &str,
) -> Result<Vec<GameSummary>, SearchError> {
    let key = query.trim().to_lowercase();
    if let Some(cached) = state.search_cache.get(&key).await {
        return Ok(cached);
    }

    let results = search_games(&state.http_client, &key).await.map_err(|e| {
        warn!("Game search failed for '{}': {}", key, e);
        e
    })?;
    info!("Game search '{}' returned {} games", key, results.len());
    state.search_cache.insert(key, results.clone()).await;
    Ok(results)
}
