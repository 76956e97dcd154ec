//! Outbound request description.

use axum::http::HeaderMap;
use url::Url;

use crate::error::{GatewayError, GatewayResult};
use crate::relay::headers::forward_request_headers;

/// A single upstream fetch, built per inbound call and dropped afterwards.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Absolute http(s) target.
    pub target: Url,

    /// Inbound headers forwarded to the origin.
    pub headers: HeaderMap,

    /// Extra query parameters appended to the target.
    pub query: Vec<(String, String)>,
}

impl ForwardRequest {
    /// Build a direct-relay request from the raw `url` parameter.
    ///
    /// Only `range` is taken from the inbound headers.
    pub fn direct(raw_url: &str, inbound: &HeaderMap) -> GatewayResult<Self> {
        let target = parse_target(raw_url)?;
        Ok(Self {
            target,
            headers: forward_request_headers(inbound),
            query: Vec::new(),
        })
    }

    /// Build a credentialed request for `path` below `origin_base`.
    ///
    /// Path segments are appended (and percent-encoded) individually, so a
    /// client cannot climb out of the base path with `..`.
    pub fn credentialed(origin_base: &Url, path: &str, query: &[(String, String)]) -> Self {
        let mut target = origin_base.clone();
        if let Ok(mut segments) = target.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty() && *s != "." && *s != ".."));
        }
        target.set_query(None);

        Self {
            target,
            headers: HeaderMap::new(),
            query: query.to_vec(),
        }
    }

    /// Set `name` to `value`, dropping every previous occurrence.
    pub fn set_query_param(&mut self, name: &str, value: &str) {
        self.query.retain(|(k, _)| k != name);
        self.query.push((name.to_string(), value.to_string()));
    }
}

/// Parse and check a relay target: absolute, http or https, with a host.
pub fn parse_target(raw_url: &str) -> GatewayResult<Url> {
    let invalid = |reason: String| GatewayError::InvalidTarget {
        url: raw_url.to_string(),
        reason,
    };

    let url = Url::parse(raw_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.has_host() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}
