use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::encoding::encode_component;
use crate::core::types::{GameConfig, GameSlug};

pub const SDK_SCRIPT_URL: &str = "https://builds.crazygames.com/gameframe/v1/bundle.js";
pub const TITLE_SUFFIX: &str = " | SaneGames";

/// Shown when every relay failed for a slug.
pub fn exhausted_message() -> &'static str {
    "Loading failed. Could not fetch game configuration. The game slug might be incorrect, \
     the game might not exist, or all our proxy services are down. Please try again later \
     or check the slug."
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("Game configuration is missing the main game URL. Cannot load.")]
    MissingGameUrl,
}

/// Everything the page needs to boot the game SDK.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchPlan {
    pub slug: GameSlug,
    pub title: String,
    /// Game document routed through our relay.
    pub game_url: String,
    pub original_game_url: String,
    pub sdk_script_url: String,
    /// Resolved config with `url` swapped for `game_url`.
    pub config: GameConfig,
    pub resolved_at: String,
}

impl LaunchPlan {
    pub fn from_config(
        slug: &GameSlug,
        config: &GameConfig,
        relay_public_url: &str,
    ) -> Result<Self, LaunchError> {
        let original = config.url().ok_or(LaunchError::MissingGameUrl)?;
        let game_url = proxied_game_url(relay_public_url, original);

        Ok(Self {
            slug: slug.clone(),
            title: page_title(slug, config),
            config: config.with_field("url", Value::String(game_url.clone())),
            original_game_url: original.to_string(),
            game_url,
            sdk_script_url: SDK_SCRIPT_URL.to_string(),
            resolved_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

pub fn page_title(slug: &GameSlug, config: &GameConfig) -> String {
    format!("{}{}", config.game_name().unwrap_or(slug.as_str()), TITLE_SUFFIX)
}

/// `<relay>?target=<encoded original>`; appends with `&` if the relay URL
/// already carries a query.
pub fn proxied_game_url(relay_public_url: &str, original: &str) -> String {
    let sep = if relay_public_url.contains('?') { '&' } else { '?' };
    format!("{}{}target={}", relay_public_url, sep, encode_component(original))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(v: Value) -> GameConfig {
        GameConfig::from(v.as_object().cloned().unwrap())
    }

    #[test]
    fn plan_proxies_game_url() {
        let slug = GameSlug::parse("tiny-fishing").unwrap();
        let cfg = config(json!({
            "url": "https://games.crazygames.com/en_US/tiny-fishing/game.html",
            "gameName": "Tiny Fishing",
            "locale": "en_US"
        }));

        let plan = LaunchPlan::from_config(&slug, &cfg, "https://sg.example/proxy-game").unwrap();

        assert_eq!(plan.title, "Tiny Fishing | SaneGames");
        assert_eq!(
            plan.game_url,
            "https://sg.example/proxy-game?target=https%3A%2F%2Fgames.crazygames.com%2Fen_US%2Ftiny-fishing%2Fgame.html"
        );
        assert_eq!(plan.config.url(), Some(plan.game_url.as_str()));
        assert_eq!(plan.config.get("locale"), Some(&json!("en_US")));
        assert_eq!(cfg.url(), Some(plan.original_game_url.as_str()));
        assert_eq!(plan.sdk_script_url, SDK_SCRIPT_URL);
    }

    #[test]
    fn title_falls_back_to_slug() {
        let slug = GameSlug::parse("moto-x3m").unwrap();
        assert_eq!(page_title(&slug, &config(json!({"url": "u"}))), "moto-x3m | SaneGames");
    }

    #[test]
    fn missing_url_is_an_error() {
        let slug = GameSlug::parse("x").unwrap();
        let err = LaunchPlan::from_config(&slug, &config(json!({"gameName": "X"})), "http://r")
            .unwrap_err();
        assert_eq!(err, LaunchError::MissingGameUrl);
        assert_eq!(err.to_string(), "Game configuration is missing the main game URL. Cannot load.");
    }

    #[test]
    fn relay_with_existing_query() {
        assert_eq!(
            proxied_game_url("https://r.example/fn?v=2", "https://g/a b"),
            "https://r.example/fn?v=2&target=https%3A%2F%2Fg%2Fa%20b"
        );
    }
}
