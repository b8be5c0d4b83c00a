use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::encoding::encode_component;

/// Caller-supplied game identifier (e.g. `subway-surfers`).
///
/// Opaque beyond being URL-encodable; surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GameSlug(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("game slug must not be empty")]
pub struct InvalidSlug;

impl GameSlug {
    pub fn parse(raw: &str) -> Result<Self, InvalidSlug> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidSlug);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encoded form, safe to splice into a URL path or query value.
    pub fn encoded(&self) -> String {
        encode_component(&self.0)
    }
}

impl std::fmt::Display for GameSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for GameSlug {
    type Err = InvalidSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Configuration object the upstream platform embeds in its game page.
///
/// Treated opaquely: only `url` and `gameName` have accessors, everything
/// else is handed back to the caller untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameConfig(Map<String, Value>);

impl GameConfig {
    /// Upstream location of the playable document.
    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(Value::as_str)
    }

    /// Display name, when the upstream provides a non-empty one.
    pub fn game_name(&self) -> Option<&str> {
        self.0
            .get("gameName")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub(crate) fn with_field(&self, key: &str, value: Value) -> Self {
        let mut copy = self.0.clone();
        copy.insert(key.to_string(), value);
        Self(copy)
    }
}

impl From<Map<String, Value>> for GameConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One game entry from the upstream search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    pub cover_url: String,
    /// Relative link to the wrapper page for this game.
    pub play_path: String,
}

#[derive(Debug, Deserialize)]
pub struct GameQuery {
    #[serde(default)]
    pub game: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<GameSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slug_trims_and_rejects_blank() {
        assert_eq!(GameSlug::parse("  tiny-fishing ").unwrap().as_str(), "tiny-fishing");
        assert_eq!(GameSlug::parse("   "), Err(InvalidSlug));
        assert_eq!(GameSlug::parse(""), Err(InvalidSlug));
    }

    #[test]
    fn slug_encoding_escapes_reserved_characters() {
        let slug = GameSlug::parse("a b/c?d").unwrap();
        assert_eq!(slug.encoded(), "a%20b%2Fc%3Fd");
    }

    #[test]
    fn config_accessors_ignore_wrong_types() {
        let map = json!({"url": 42, "gameName": "  "})
            .as_object()
            .cloned()
            .unwrap();
        let config = GameConfig::from(map);
        assert_eq!(config.url(), None);
        assert_eq!(config.game_name(), None);
    }

    #[test]
    fn with_field_leaves_original_untouched() {
        let map = json!({"url": "https://a/b.html"}).as_object().cloned().unwrap();
        let config = GameConfig::from(map);
        let patched = config.with_field("url", json!("https://relay/?target=x"));
        assert_eq!(config.url(), Some("https://a/b.html"));
        assert_eq!(patched.url(), Some("https://relay/?target=x"));
    }
}
