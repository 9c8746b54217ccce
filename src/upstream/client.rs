//! reqwest-backed [`Fetch`] implementation.
//!
//! Two clients share the same settings and differ only in redirect policy;
//! reqwest fixes the policy per client, not per request. Neither client
//! decodes bodies: content-encoding is the pipeline's decision.

use std::time::Duration;

use axum::http::HeaderName;
use futures_util::TryStreamExt;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::proxy::header_set::HeaderSet;
use crate::upstream::{Fetch, OutboundRequest, RedirectPolicy, UpstreamResponse};

/// Headers that describe the caller's connection or body, never the GET we send.
const SKIPPED_REQUEST_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn skip_on_wire(name: &HeaderName) -> bool {
    SKIPPED_REQUEST_HEADERS.contains(&name.as_str())
}

/// Forwarding client.
#[derive(Clone)]
pub struct HttpFetcher {
    follow: reqwest::Client,
    manual: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let follow = Self::builder(config)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;
        let manual = Self::builder(config)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { follow, manual })
    }

    fn builder(config: &UpstreamConfig) -> reqwest::ClientBuilder {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        builder
    }

    fn client(&self, policy: RedirectPolicy) -> &reqwest::Client {
        match policy {
            RedirectPolicy::Follow => &self.follow,
            RedirectPolicy::Manual => &self.manual,
        }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let mut headers = reqwest::header::HeaderMap::with_capacity(request.headers.len());
        for (name, value) in request.headers.iter() {
            if !skip_on_wire(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        tracing::debug!(
            target_url = %request.target,
            redirect = ?request.redirect,
            header_count = headers.len(),
            "Forwarding request"
        );

        let response = self
            .client(request.redirect)
            .get(request.target)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        let reason = response
            .extensions()
            .get::<hyper::ext::ReasonPhrase>()
            .map(|r| bytes::Bytes::copy_from_slice(r.as_bytes()));
        let headers = HeaderSet::from_header_map(response.headers());
        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other);

        Ok(UpstreamResponse {
            status,
            reason,
            headers,
            body: Box::pin(body),
        })
    }
}
