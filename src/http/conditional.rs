use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::{
    HeaderMap,
    header::{IF_MODIFIED_SINCE, IF_NONE_MATCH},
};
use tracing::debug;

/// Outcome of checking the request validators against a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Client copy is stale or absent, send the body
    Fresh,
    /// Client copy is current, answer 304
    NotModified,
}

/// Weak validator built from modification time (ms) and length
///
/// Not a content hash: two files of equal size and mtime share an ETag.
pub fn etag(modified: SystemTime, len: u64) -> String {
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("\"{millis}-{len}\"")
}

/// `Last-Modified` header value
pub fn last_modified(modified: SystemTime) -> String {
    httpdate::fmt_http_date(modified.max(UNIX_EPOCH))
}

/// Drop sub-second precision, HTTP dates only carry whole seconds
fn whole_seconds(time: SystemTime) -> SystemTime {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// Check `If-Modified-Since` then `If-None-Match`
///
/// A satisfied `If-Modified-Since` wins without looking at `If-None-Match`.
/// Unparseable dates are ignored. The ETag comparison is exact.
pub fn evaluate(headers: &HeaderMap, modified: SystemTime, etag: &str) -> Freshness {
    let since = headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok());
    if let Some(since) = since
        && since >= whole_seconds(modified)
    {
        debug!("if-modified-since {:?} satisfied", since);
        return Freshness::NotModified;
    }

    let Some(if_none_match) = headers.get(IF_NONE_MATCH) else {
        return Freshness::Fresh;
    };
    let Ok(if_none_match_str) = if_none_match.to_str() else {
        return Freshness::Fresh;
    };
    if if_none_match_str == etag {
        debug!("if-none-match {} satisfied", etag);
        return Freshness::NotModified;
    }
    Freshness::Fresh
}
