use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::core::types::GameConfig;

use super::AttemptFailure;

// Upstream embeds its SDK options as `var options = {...};` in an inline
// <script>. There is no API for this, so a lazy match up to the first `};`
// is the whole contract.
static OPTIONS_PATTERN: OnceLock<Regex> = OnceLock::new();

fn options_pattern() -> &'static Regex {
    OPTIONS_PATTERN
        .get_or_init(|| Regex::new(r"var options = (\{[\s\S]*?\});").expect("valid options pattern"))
}

/// Pull the embedded game configuration out of a game page.
///
/// Returns [`AttemptFailure::NoConfigFound`] when the page carries no
/// `var options = {...};` assignment, and [`AttemptFailure::ParseError`] when
/// the captured literal is not a JSON object (e.g. unquoted keys).
pub fn extract_config(body: &str) -> Result<GameConfig, AttemptFailure> {
    let raw = options_pattern()
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or(AttemptFailure::NoConfigFound)?;

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(GameConfig::from(map)),
        Ok(_) => Err(AttemptFailure::ParseError("expected a JSON object".to_string())),
        Err(e) => Err(AttemptFailure::ParseError(e.to_string())),
    }
}
