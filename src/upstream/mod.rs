//! Forwarding call to the upstream.
//!
//! # Data Flow
//! ```text
//! OutboundRequest (target, HeaderSet, redirect policy)
//!     → Fetch::fetch (client.rs: reqwest)
//!     → UpstreamResponse (status, reason, HeaderSet, BodyStream)
//! ```
//!
//! # Design Decisions
//! - The pipeline depends only on the `Fetch` trait so it can be driven
//!   without sockets in tests
//! - Always GET; the caller's body is never forwarded
//! - No retries; failures surface once as `ProxyError`

pub mod client;

use std::future::Future;
use std::io;
use std::pin::Pin;

use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::Stream;
use url::Url;

use crate::error::ProxyError;
use crate::proxy::header_set::HeaderSet;

pub use client::HttpFetcher;

/// Upstream body as a byte stream.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Whether the client follows upstream redirects itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    Follow,
    Manual,
}

impl RedirectPolicy {
    pub fn from_follow(follow: bool) -> Self {
        if follow {
            RedirectPolicy::Follow
        } else {
            RedirectPolicy::Manual
        }
    }
}

/// The single GET the proxy issues.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub target: Url,
    pub headers: HeaderSet,
    pub redirect: RedirectPolicy,
}

/// What upstream answered.
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Reason phrase, kept only when upstream sent a non-canonical one.
    pub reason: Option<Bytes>,
    pub headers: HeaderSet,
    pub body: BodyStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Capability to perform the forwarding call.
pub trait Fetch: Send + Sync {
    fn fetch(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, ProxyError>> + Send;
}
