//! Error taxonomy for the forwarding pipeline.
//!
//! Client-side mistakes (missing or bad `url`, unparseable option lists) map
//! to 400 and never reach the upstream. Upstream transport faults map to the
//! 502/504 class. An upstream that answers at all, even with 4xx/5xx, is not
//! an error: its status is passed through verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::observability::metrics;

/// Errors produced while handling a single proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `url` query parameter is absent or empty.
    #[error("Missing URL parameter")]
    MissingTargetUrl,

    /// The `url` query parameter is not an absolute http(s) URL.
    #[error("Invalid URL parameter {url:?}: {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    /// A list-valued option could not be parsed.
    #[error("Malformed {param} parameter: {reason}")]
    MalformedOptions { param: &'static str, reason: String },

    /// The forwarding call failed before a response arrived.
    #[error("Upstream request failed: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// The client-side timeout elapsed before upstream answered.
    #[error("Upstream request timed out")]
    UpstreamTimeout,

    /// Reading or decoding the upstream body failed while buffering it.
    #[error("Upstream body could not be read: {0}")]
    UpstreamBody(#[source] std::io::Error),
}

impl ProxyError {
    /// Status code returned to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTargetUrl
            | ProxyError::InvalidTargetUrl { .. }
            | ProxyError::MalformedOptions { .. } => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnreachable(_) | ProxyError::UpstreamBody(_) => {
                StatusCode::BAD_GATEWAY
            }
            ProxyError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingTargetUrl => "missing_url",
            ProxyError::InvalidTargetUrl { .. } => "invalid_url",
            ProxyError::MalformedOptions { .. } => "malformed_options",
            ProxyError::UpstreamUnreachable(_) => "unreachable",
            ProxyError::UpstreamTimeout => "timeout",
            ProxyError::UpstreamBody(_) => "body",
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::UpstreamTimeout
        } else {
            ProxyError::UpstreamUnreachable(err)
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::warn!(kind = self.kind(), error = %self, "Rejected request");
        } else {
            tracing::error!(kind = self.kind(), error = %self, "Upstream failure");
            metrics::record_upstream_error(self.kind());
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(ProxyError::MissingTargetUrl.status(), StatusCode::BAD_REQUEST);
        let err = ProxyError::MalformedOptions {
            param: "appendReqHeaders",
            reason: "expected value".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("appendReqHeaders"));
    }

    #[test]
    fn test_upstream_errors_are_gateway_class() {
        assert_eq!(ProxyError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = ProxyError::UpstreamBody(std::io::Error::other("truncated"));
        assert_eq!(body.status(), StatusCode::BAD_GATEWAY);
    }
}
