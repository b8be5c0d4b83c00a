//! Framing-free fetch relay (the `proxy-game` endpoint).
//!
//! Fetches a target document on behalf of the browser, drops anti-framing
//! headers, and injects a `<base>` tag into HTML so relative asset URLs keep
//! resolving against the original host.

pub mod headers;
pub mod rewrite;

use base64::Engine as _;
use reqwest::header::{HeaderMap, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Error: \"target\" query parameter is required.")]
    MissingTarget,

    #[error("Error: Invalid \"target\" URL: {0}")]
    InvalidTargetUrl(String),

    #[error("Error: Could not proxy target URL. {0}")]
    UpstreamFetchFailure(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingTarget | RelayError::InvalidTargetUrl(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamFetchFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Plain-text error response. CORS stays open so the browser can read it.
    pub fn into_response(self) -> RelayResponse {
        let mut headers = headers::cors_headers();
        headers.insert(
            CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        RelayResponse {
            status: self.status(),
            headers,
            body: RelayBody::Text(self.to_string()),
        }
    }
}

/// Request headers forwarded upstream, with browser-ish fallbacks.
#[derive(Debug, Clone, Default)]
pub struct ForwardedHeaders {
    pub user_agent: Option<String>,
    pub accept: Option<String>,
    pub accept_language: Option<String>,
}

impl ForwardedHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: reqwest::header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            user_agent: get(USER_AGENT),
            accept: get(ACCEPT),
            accept_language: get(ACCEPT_LANGUAGE),
        }
    }
}

/// Raw upstream reply, before relay policy is applied.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayBody {
    /// Passed through byte-for-byte.
    Binary(Vec<u8>),
    /// HTML after base-tag injection.
    Html(String),
    /// Relay-generated plain text (errors).
    Text(String),
}

impl RelayBody {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RelayBody::Binary(bytes) => bytes,
            RelayBody::Html(text) | RelayBody::Text(text) => text.into_bytes(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: RelayBody,
}

/// Serverless-function response framing: binary bodies travel base64-encoded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl RelayResponse {
    pub fn into_envelope(self) -> FunctionEnvelope {
        let headers = self
            .headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let (body, is_base64_encoded) = match self.body {
            RelayBody::Binary(bytes) => (base64::engine::general_purpose::STANDARD.encode(bytes), true),
            RelayBody::Html(text) | RelayBody::Text(text) => (text, false),
        };
        FunctionEnvelope {
            status_code: self.status.as_u16(),
            headers,
            body,
            is_base64_encoded,
        }
    }
}

/// Validate the `target` query parameter.
pub fn parse_target(raw: Option<&str>) -> Result<Url, RelayError> {
    let raw = raw
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RelayError::MissingTarget)?;
    let url = Url::parse(raw).map_err(|_| RelayError::InvalidTargetUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(RelayError::InvalidTargetUrl(raw.to_string())),
    }
}

/// Apply header and body policy to an upstream reply.
pub fn build_response(target: &Url, upstream: UpstreamResponse) -> RelayResponse {
    let content_type = upstream
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let mut headers = headers::relay_headers(&upstream.headers, &content_type);

    let body = if content_type.to_ascii_lowercase().contains("text/html") {
        let html = String::from_utf8_lossy(&upstream.body);
        let href = rewrite::base_href(target);
        info!("Injecting base tag {} for {}", href, target);
        headers::drop_length(&mut headers);
        RelayBody::Html(rewrite::inject_base_tag(&html, &href))
    } else {
        RelayBody::Binary(upstream.body)
    };

    RelayResponse {
        status: upstream.status,
        headers,
        body,
    }
}

/// Relay handler state: one shared client, a fallback user agent.
#[derive(Debug, Clone)]
pub struct ProxyRelay {
    client: reqwest::Client,
    default_user_agent: String,
}

impl ProxyRelay {
    pub fn new(client: reqwest::Client, default_user_agent: impl Into<String>) -> Self {
        Self {
            client,
            default_user_agent: default_user_agent.into(),
        }
    }

    pub async fn handle(&self, target: Option<&str>, forwarded: &ForwardedHeaders) -> RelayResponse {
        let target = match parse_target(target) {
            Ok(url) => url,
            Err(e) => return e.into_response(),
        };

        info!("Relaying: {}", target);
        match self.fetch_upstream(&target, forwarded).await {
            Ok(upstream) => build_response(&target, upstream),
            Err(e) => {
                error!("Relay fetch failed for {}: {}", target, e);
                e.into_response()
            }
        }
    }

    async fn fetch_upstream(
        &self,
        target: &Url,
        forwarded: &ForwardedHeaders,
    ) -> Result<UpstreamResponse, RelayError> {
        let resp = self
            .client
            .get(target.clone())
            .header(
                USER_AGENT,
                forwarded
                    .user_agent
                    .as_deref()
                    .unwrap_or(&self.default_user_agent),
            )
            .header(ACCEPT, forwarded.accept.as_deref().unwrap_or("*/*"))
            .header(
                ACCEPT_LANGUAGE,
                forwarded
                    .accept_language
                    .as_deref()
                    .unwrap_or("en-US,en;q=0.9"),
            )
            .send()
            .await
            .map_err(|e| RelayError::UpstreamFetchFailure(e.to_string()))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| RelayError::UpstreamFetchFailure(e.to_string()))?
            .to_vec();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
