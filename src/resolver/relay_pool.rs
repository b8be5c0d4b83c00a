use crate::core::encoding::encode_component;
use crate::core::types::GameSlug;

use super::ResolverError;

pub const TARGET_PLACEHOLDER: &str = "{target}";
pub const SLUG_PLACEHOLDER: &str = "{slug}";

pub const DEFAULT_TARGET_TEMPLATE: &str = "https://games.crazygames.com/en_US/{slug}/index.html";

/// Public CORS relays, most reliable first. Any of these may rotate keys or
/// disappear; override via `resolver.relays` in sanegames.json.
const DEFAULT_RELAYS: &[&str] = &[
    "https://opencors.netlify.app/.netlify/functions/main?url={target}",
    "https://corsproxy.io/?key=d6168cb0&url={target}",
    "https://api.allorigins.win/raw?url={target}",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEndpoint {
    template: String,
    requires_encoded_target: bool,
}

impl RelayEndpoint {
    pub fn new(
        template: impl Into<String>,
        requires_encoded_target: bool,
    ) -> Result<Self, ResolverError> {
        let template = template.into();
        if !template.contains(TARGET_PLACEHOLDER) {
            return Err(ResolverError::InvalidTemplate(template));
        }
        Ok(Self {
            template,
            requires_encoded_target,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn requires_encoded_target(&self) -> bool {
        self.requires_encoded_target
    }

    /// Wrap the canonical target in this relay's URL.
    pub fn relay_url(&self, target: &str) -> String {
        if self.requires_encoded_target {
            self.template
                .replace(TARGET_PLACEHOLDER, &encode_component(target))
        } else {
            self.template.replace(TARGET_PLACEHOLDER, target)
        }
    }
}

/// Ordered, non-empty list of relays. Iteration order is priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayPool(Vec<RelayEndpoint>);

impl RelayPool {
    pub fn new(relays: Vec<RelayEndpoint>) -> Result<Self, ResolverError> {
        if relays.is_empty() {
            return Err(ResolverError::EmptyRelayPool);
        }
        Ok(Self(relays))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RelayEndpoint> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RelayPool {
    fn default() -> Self {
        Self(
            DEFAULT_RELAYS
                .iter()
                .map(|t| RelayEndpoint {
                    template: (*t).to_string(),
                    requires_encoded_target: true,
                })
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a RelayPool {
    type Item = &'a RelayEndpoint;
    type IntoIter = std::slice::Iter<'a, RelayEndpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Validate a canonical target template (`{slug}` placeholder required).
pub fn check_target_template(template: &str) -> Result<(), ResolverError> {
    if template.contains(SLUG_PLACEHOLDER) {
        Ok(())
    } else {
        Err(ResolverError::InvalidTemplate(template.to_string()))
    }
}

pub fn canonical_target(template: &str, slug: &GameSlug) -> String {
    template.replace(SLUG_PLACEHOLDER, &slug.encoded())
}
