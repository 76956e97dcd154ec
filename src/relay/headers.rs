//! Header translation between client, gateway and origin.
//!
//! Inbound, only `range` reaches the origin. Outbound, only the content
//! headers a media player needs reach the client; everything else the origin
//! sends (cookies, caching, CORS, server banners) is dropped.

use axum::http::{
    header::{ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE},
    HeaderMap, HeaderName, HeaderValue,
};

/// Content type reported when the origin sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Optional origin headers copied to the client when present.
pub const PASSTHROUGH_HEADERS: [HeaderName; 4] =
    [ACCEPT_RANGES, CONTENT_RANGE, CONTENT_LENGTH, CONTENT_DISPOSITION];

/// Select the inbound headers forwarded to the origin.
pub fn forward_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(range) = inbound.get(RANGE) {
        headers.insert(RANGE, range.clone());
    }
    headers
}

/// Select the origin headers relayed to the client.
pub fn relay_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, content_type_or_default(upstream));

    for name in PASSTHROUGH_HEADERS {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }
    headers
}

/// Headers for a buffered credentialed response: the content type only.
pub fn buffered_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = upstream.get(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, value.clone());
    }
    headers
}

fn content_type_or_default(upstream: &HeaderMap) -> HeaderValue {
    upstream
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};

    #[test]
    fn test_only_range_forwarded() {
        let mut inbound = HeaderMap::new();
        inbound.insert(RANGE, HeaderValue::from_static("bytes=0-99"));
        inbound.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        inbound.insert(COOKIE, HeaderValue::from_static("session=1"));

        let forwarded = forward_request_headers(&inbound);
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[RANGE], "bytes=0-99");
    }

    #[test]
    fn test_no_range_forwards_nothing() {
        let mut inbound = HeaderMap::new();
        inbound.insert(COOKIE, HeaderValue::from_static("session=1"));
        assert!(forward_request_headers(&inbound).is_empty());
    }

    #[test]
    fn test_response_headers_filtered() {
        let mut upstream = HeaderMap::new();
        upstream.insert(CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
        upstream.insert(CONTENT_RANGE, HeaderValue::from_static("bytes 0-99/1000"));
        upstream.insert(CONTENT_LENGTH, HeaderValue::from_static("100"));
        upstream.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        upstream.insert(SET_COOKIE, HeaderValue::from_static("tracker=1"));
        upstream.insert("server", HeaderValue::from_static("origin/1.0"));

        let relayed = relay_response_headers(&upstream);
        assert_eq!(relayed.len(), 4);
        assert_eq!(relayed[CONTENT_TYPE], "video/mp4");
        assert_eq!(relayed[CONTENT_RANGE], "bytes 0-99/1000");
        assert!(relayed.get(SET_COOKIE).is_none());
        assert!(relayed.get("server").is_none());
    }

    #[test]
    fn test_content_type_defaults() {
        let relayed = relay_response_headers(&HeaderMap::new());
        assert_eq!(relayed.len(), 1);
        assert_eq!(relayed[CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_buffered_headers_keep_content_type_only() {
        let mut upstream = HeaderMap::new();
        upstream.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.insert(CONTENT_LENGTH, HeaderValue::from_static("2"));

        let headers = buffered_response_headers(&upstream);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(buffered_response_headers(&HeaderMap::new()).is_empty());
    }
}
