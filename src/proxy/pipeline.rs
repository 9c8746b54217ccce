//! Per-request orchestration.
//!
//! ```text
//! query ─▶ Options ─▶ outbound headers ─▶ Fetch ─▶ inbound headers
//!                                                     │
//!                              Redirect ◀── location? ─┤
//!                                                     ▼
//!                                      body materialization ─▶ Forwarded
//! ```

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

use crate::error::ProxyError;
use crate::proxy::body::{materialize, ResponseBody};
use crate::proxy::header_set::HeaderSet;
use crate::proxy::inbound::build_response_headers;
use crate::proxy::options::Options;
use crate::proxy::outbound::build_request_headers;
use crate::proxy::redirect::{intercept, Redirect};
use crate::upstream::{Fetch, OutboundRequest, RedirectPolicy};

/// Upstream response after transformation.
#[derive(Debug)]
pub struct Forwarded {
    pub status: StatusCode,
    pub reason: Option<Bytes>,
    pub headers: HeaderSet,
    pub body: ResponseBody,
}

/// What the caller receives.
#[derive(Debug)]
pub enum ProxyResponse {
    Forward(Forwarded),
    Redirect(Redirect),
}

/// Run one request through the pipeline.
///
/// Nothing is sent upstream unless the options parse.
pub async fn handle<F: Fetch>(
    fetcher: &F,
    query: Option<&str>,
    inbound: &HeaderMap,
) -> Result<ProxyResponse, ProxyError> {
    let options = Options::from_query(query)?;

    let request = OutboundRequest {
        target: options.target.clone(),
        headers: build_request_headers(inbound, &options),
        redirect: RedirectPolicy::from_follow(options.follow_redirect),
    };

    let upstream = fetcher.fetch(request).await?;
    let mut headers = build_response_headers(upstream.headers, &options);

    // The body is discarded on interception, so it is never buffered for it.
    if let Some(redirect) = intercept(options.redirect_with_proxy, upstream.status, &headers) {
        tracing::debug!(
            status = %redirect.status,
            location = ?redirect.location,
            "Intercepting upstream redirect"
        );
        return Ok(ProxyResponse::Redirect(redirect));
    }

    let body = materialize(upstream.body, &mut headers, options.decompress).await?;

    Ok(ProxyResponse::Forward(Forwarded {
        status: upstream.status,
        reason: upstream.reason,
        headers,
        body,
    }))
}
