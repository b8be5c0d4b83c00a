use aho_corasick::{AhoCorasick, AhoCorasickBuilder, BuildError};
use std::sync::OnceLock;

// Ad and tracking hosts injected by the game SDK. Substring patterns, so
// subdomains and path-qualified URLs are caught as well.
pub const DEFAULT_AD_DOMAINS: &[&str] = &[
    "doubleclick.net",
    "adservice.google.com",
    "googlesyndication.com",
    "ads.crazygames.com",
    "pagead2.googlesyndication.com",
    "securepubads.g.doubleclick.net",
    "cpx.to",
    "adnxs.com",
    "googletagmanager.com",
    "imasdk.googleapis.com",
];

static DEFAULT_MATCHER: OnceLock<AhoCorasick> = OnceLock::new();

fn build_matcher<I, P>(patterns: I) -> Result<AhoCorasick, BuildError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .build(patterns)
}

/// URL blocklist matcher.
#[derive(Debug, Clone)]
pub struct AdFilter {
    matcher: AhoCorasick,
}

impl AdFilter {
    pub fn new<S: AsRef<str>>(domains: &[S]) -> Result<Self, BuildError> {
        let patterns: Vec<&str> = domains
            .iter()
            .map(|d| d.as_ref().trim())
            .filter(|d| !d.is_empty())
            .collect();
        Ok(Self {
            matcher: build_matcher(patterns)?,
        })
    }

    /// Returns `true` if this URL should never reach the network.
    pub fn is_blocked(&self, url: &str) -> bool {
        self.matcher.is_match(url)
    }
}

impl Default for AdFilter {
    fn default() -> Self {
        let matcher = DEFAULT_MATCHER.get_or_init(|| {
            // Patterns are simple substrings; Aho-Corasick gives linear-time scan.
            build_matcher(DEFAULT_AD_DOMAINS).expect("valid ad-block patterns")
        });
        Self {
            matcher: matcher.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_default_ad_hosts() {
        let filter = AdFilter::default();
        assert!(filter.is_blocked("https://securepubads.g.doubleclick.net/gampad/ads?x=1"));
        assert!(filter.is_blocked("https://IMASDK.googleapis.com/js/sdkloader/ima3.js"));
        assert!(!filter.is_blocked("https://games.crazygames.com/en_US/x/index.html"));
    }

    #[test]
    fn custom_list_replaces_defaults() {
        let filter = AdFilter::new(&["tracker.test", "  "]).unwrap();
        assert!(filter.is_blocked("https://cdn.tracker.test/p.gif"));
        assert!(!filter.is_blocked("https://doubleclick.net/"));
    }
}
