//! Donation gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────▶ http::server (request id, trace, CORS, limits, timeout)
//!                 │
//!                 ▼
//!             functions (validate → secrets → build/sign/submit → confirm)
//!                 │                         │
//!                 ▼                         ▼
//!             records::Recorder        blockchain::Ledger
//!             (PostgREST tables)       (algod REST node)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use donation_gateway::config::{apply_env_overrides, load_config, EnvSecrets, GatewayConfig};
use donation_gateway::http::HttpServer;
use donation_gateway::lifecycle::{build_context, wait_for_signal, Shutdown};
use donation_gateway::observability::{init_logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "donation-gateway", version, about = "Algorand donation and certificate gateway")]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    let config = apply_env_overrides(config, &EnvSecrets)?;

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "donation-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        algod_url = %config.ledger.algod_url,
        request_timeout_secs = config.timeouts.request_secs,
        confirmation_rounds = config.ledger.confirmation_rounds,
        confirmation_timeout_secs = config.ledger.confirmation_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
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

    let ctx = build_context(config)?;
    let server = HttpServer::new(ctx);

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
