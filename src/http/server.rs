//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router; every method and path reaches the proxy handler
//! - Wire up middleware (request id, tracing)
//! - Run the pipeline and turn its result into a response
//! - Record per-request metrics and a completion log line
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::request::{request_id, request_id_of};
use crate::lifecycle::shutdown;
use crate::observability::metrics::{self, Outcome};
use crate::proxy::{self, ProxyResponse};
use crate::upstream::{Fetch, HttpFetcher};

/// Application state injected into handlers.
pub struct AppState<F> {
    pub fetcher: Arc<F>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
        }
    }
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that forwards with a reqwest client built from `config`.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let fetcher = HttpFetcher::new(&config.upstream)?;
        let router = build_router(fetcher);
        Ok(Self { router })
    }

    /// Run the server on `listener` until `shutdown_rx` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the router around any [`Fetch`] implementation.
pub fn build_router<F: Fetch + 'static>(fetcher: F) -> Router {
    let state = AppState {
        fetcher: Arc::new(fetcher),
    };

    let middleware = ServiceBuilder::new()
        .layer(axum::middleware::from_fn(request_id))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    request_id = %request_id_of(req),
                )
            }),
        );

    Router::new()
        .route("/", any(proxy_handler::<F>))
        .route("/{*path}", any(proxy_handler::<F>))
        .with_state(state)
        .layer(middleware)
}

/// Main proxy handler.
///
/// The caller's method, path and body are ignored; only the query string and
/// headers feed the pipeline.
async fn proxy_handler<F: Fetch + 'static>(
    State(state): State<AppState<F>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let (parts, _body) = request.into_parts();

    let result = proxy::handle(state.fetcher.as_ref(), parts.uri.query(), &parts.headers).await;

    let (outcome, response) = match result {
        Ok(resp @ ProxyResponse::Forward(_)) => (Outcome::Forwarded, resp.into_response()),
        Ok(resp @ ProxyResponse::Redirect(_)) => (Outcome::Redirected, resp.into_response()),
        Err(err) => {
            let outcome = if err.status().is_client_error() {
                Outcome::Rejected
            } else {
                Outcome::Failed
            };
            (outcome, err.into_response())
        }
    };

    let status = response.status();
    metrics::record_request(status.as_u16(), outcome, start);
    tracing::info!(
        status = status.as_u16(),
        outcome = outcome.as_str(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
