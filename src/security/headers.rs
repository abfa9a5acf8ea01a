//! Header filtering in both directions.
//!
//! # Responsibilities
//! - Build the outbound header set from a fixed allow-list
//! - Strip hop-by-hop and cookie headers from upstream responses
//!
//! # Design Decisions
//! - Allow-list outbound, deny-list inbound
//! - No cookies or credentials ever reach upstream
//! - Lookups go through `HeaderMap`, which is case-insensitive

use axum::http::{header, HeaderMap, HeaderName};

/// Inbound headers forwarded to upstream unchanged.
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 2] = [header::USER_AGENT, header::ACCEPT];

/// Upstream response headers never relayed to the caller.
pub const STRIPPED_RESPONSE_HEADERS: [&str; 9] = [
    "transfer-encoding",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "upgrade",
    "set-cookie",
];

/// Copy the allow-listed request headers that carry a non-empty value.
pub fn forward_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for name in FORWARDED_REQUEST_HEADERS.iter() {
        if let Some(value) = inbound.get(name) {
            if !value.is_empty() {
                forwarded.insert(name.clone(), value.clone());
            }
        }
    }
    forwarded
}

pub fn is_stripped(name: &HeaderName) -> bool {
    STRIPPED_RESPONSE_HEADERS
        .iter()
        .any(|stripped| name.as_str().eq_ignore_ascii_case(stripped))
}

/// Drop every denied header, keeping all values of the rest in order.
pub fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut sanitized = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if !is_stripped(name) {
            sanitized.append(name.clone(), value.clone());
        }
    }
    sanitized
}
