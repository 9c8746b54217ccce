//! Headers sent to the upstream.

use axum::http::{header, HeaderMap, HeaderValue};
use url::Url;

use crate::proxy::header_set::HeaderSet;
use crate::proxy::options::Options;

/// Build the outbound header set from the caller's headers and the options.
///
/// Order matters: the caller's headers accumulate, `appendReqHeaders` then
/// replaces per name, `deleteReqHeaders` strips, and `host` is forced last so
/// nothing the caller sends can override it.
pub fn build_request_headers(inbound: &HeaderMap, options: &Options) -> HeaderSet {
    let mut headers = if options.ignore_req_headers {
        HeaderSet::new()
    } else {
        HeaderSet::from_header_map(inbound)
    };

    for (name, value) in &options.append_req_headers {
        headers.set(name.clone(), value.clone());
    }

    for name in &options.delete_req_headers {
        headers.delete(name);
    }

    if let Some(host) = host_header(&options.target) {
        headers.set(header::HOST, host);
    } else {
        headers.delete(&header::HOST);
    }

    headers
}

/// `host[:port]` for the target, omitting the port when it is the scheme default.
fn host_header(target: &Url) -> Option<HeaderValue> {
    let host = target.host_str()?;
    let authority = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    HeaderValue::from_str(&authority).ok()
}
