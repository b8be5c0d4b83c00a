use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE,
};

/// Upstream headers copied to the client. Everything else is dropped,
/// including `X-Frame-Options` and `Content-Security-Policy`.
pub const PASS_THROUGH_HEADERS: &[&str] = &[
    "content-disposition",
    "content-length",
    "date",
    "etag",
    "last-modified",
    "cache-control",
    "expires",
    "vary",
];

pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers
}

/// Client-facing headers for a relayed upstream response.
pub fn relay_headers(upstream: &HeaderMap, content_type: &str) -> HeaderMap {
    let mut headers = cors_headers();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(CONTENT_TYPE, value);
    }

    for &name in PASS_THROUGH_HEADERS {
        let header = HeaderName::from_static(name);
        for value in upstream.get_all(&header) {
            headers.append(header.clone(), value.clone());
        }
    }
    headers
}

/// Body was rewritten; the upstream length no longer applies.
pub fn drop_length(headers: &mut HeaderMap) {
    headers.remove(CONTENT_LENGTH);
}
