//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by response status and outcome
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_upstream_errors_total` (counter): forwarding failures by kind
//! - `proxy_redirects_intercepted_total` (counter): redirects sent to callers
//! - `proxy_decompressed_bytes_total` (counter): bytes produced by decoding
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests and
//!   metrics-disabled deployments pay almost nothing
//! - Labels stay low-cardinality: no target URLs or hosts

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// How a request left the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Forwarded,
    Redirected,
    Rejected,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Forwarded => "forwarded",
            Outcome::Redirected => "redirected",
            Outcome::Rejected => "rejected",
            Outcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(status: u16, outcome: Outcome, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "status" => status.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
    if outcome == Outcome::Redirected {
        ::metrics::counter!("proxy_redirects_intercepted_total").increment(1);
    }
}

/// Record a failed forwarding call.
pub fn record_upstream_error(kind: &'static str) {
    ::metrics::counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}

/// Record bytes produced by content decoding.
pub fn record_decompressed(bytes: usize) {
    ::metrics::counter!("proxy_decompressed_bytes_total").increment(bytes as u64);
}
