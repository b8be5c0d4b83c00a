#![allow(dead_code)]

use async_trait::async_trait;
use sanegames::resolver::{FetchError, FetchedPage, Fetcher, RelayEndpoint, RelayPool};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Page body the way the upstream platform embeds its options.
pub fn game_page(options_json: &str) -> String {
    format!(
        "<html><head><script>\nvar options = {};\nwindow.boot(options);\n</script></head></html>",
        options_json
    )
}

#[derive(Clone)]
pub enum Reply {
    Page { status: u16, body: String },
    Network,
}

#[derive(Clone)]
struct Script {
    delay: Option<Duration>,
    reply: Reply,
}

/// Fake relay network keyed by host. Unknown hosts fail with a network error.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, host: &str, status: u16, body: impl Into<String>) -> Self {
        self.scripts.insert(
            host.to_string(),
            Script {
                delay: None,
                reply: Reply::Page {
                    status,
                    body: body.into(),
                },
            },
        );
        self
    }

    pub fn network_error(mut self, host: &str) -> Self {
        self.scripts.insert(
            host.to_string(),
            Script {
                delay: None,
                reply: Reply::Network,
            },
        );
        self
    }

    pub fn delayed(mut self, host: &str, delay: Duration) -> Self {
        if let Some(script) = self.scripts.get_mut(host) {
            script.delay = Some(delay);
        }
        self
    }

    /// Hosts contacted so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch_text(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        self.calls.lock().unwrap().push(host.clone());

        let Some(script) = self.scripts.get(&host).cloned() else {
            return Err(FetchError::Request(format!("no route to {}", host)));
        };
        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }
        match script.reply {
            Reply::Page { status, body } => Ok(FetchedPage { status, body }),
            Reply::Network => Err(FetchError::Request("connection reset".into())),
        }
    }
}

/// Pool of relays on the given hosts, each `https://<host>/raw?url={target}`.
pub fn pool(hosts: &[&str]) -> RelayPool {
    RelayPool::new(
        hosts
            .iter()
            .map(|h| RelayEndpoint::new(format!("https://{}/raw?url={{target}}", h), true).unwrap())
            .collect(),
    )
    .unwrap()
}
