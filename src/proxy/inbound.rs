//! Headers returned to the caller.

use axum::http::{header, HeaderName, HeaderValue};

use crate::proxy::header_set::HeaderSet;
use crate::proxy::options::Options;

/// CORS headers the proxy always adds to forwarded responses.
pub const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET,HEAD,POST,OPTIONS"),
    (header::ACCESS_CONTROL_MAX_AGE, "86400"),
];

/// Derive the caller-facing headers from upstream's.
///
/// Deletion runs before the proxy's CORS headers are appended, so
/// `deleteResHeaders` can never remove them.
pub fn build_response_headers(upstream: HeaderSet, options: &Options) -> HeaderSet {
    let mut headers = upstream;

    for (name, value) in &options.append_res_headers {
        headers.set(name.clone(), value.clone());
    }

    if !options.delete_res_headers.is_empty() {
        for name in &options.delete_res_headers {
            headers.delete(name);
        }
        // Upstream CORS would otherwise sit next to ours.
        for (name, _) in &CORS_HEADERS {
            headers.delete(name);
        }
    }

    for (name, value) in CORS_HEADERS {
        headers.append(name, HeaderValue::from_static(value));
    }

    headers
}
