//! Query-driven HTTP forwarding proxy.
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  FETCH PROXY                      │
//!   GET /?url=...      │  ┌────────┐   ┌─────────┐   ┌────────────────┐   │
//!   ───────────────────┼─▶│ http   │──▶│ options │──▶│ outbound       │   │
//!                      │  │ server │   │ parser  │   │ header builder │   │
//!                      │  └────────┘   └─────────┘   └───────┬────────┘   │
//!                      │                                     ▼            │
//!                      │                             ┌────────────────┐   │     Upstream
//!                      │                             │ upstream fetch │◀──┼───▶ (url)
//!                      │                             └───────┬────────┘   │
//!                      │                                     ▼            │
//!   response /         │  ┌──────────┐  ┌──────────┐  ┌────────────────┐  │
//!   redirect           │  │ response │◀─│ body /   │◀─│ inbound        │  │
//!   ◀──────────────────┼──│ emit     │  │ redirect │  │ header builder │  │
//!                      │  └──────────┘  └──────────┘  └────────────────┘  │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use fetch_proxy::config::{load_config, ProxyConfig};
use fetch_proxy::lifecycle::signals::spawn_signal_task;
use fetch_proxy::observability::{logging, metrics};
use fetch_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "fetch-proxy")]
#[command(about = "Forward requests to the URL named in their query string", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("fetch-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        connect_timeout_secs = config.upstream.connect_timeout_secs,
        request_timeout_secs = config.upstream.request_timeout_secs,
        max_redirects = config.upstream.max_redirects,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_task(shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
