//! API gateway binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                       API GATEWAY                        │
//!                 │                                                          │
//!   Client ──────▶│  /health, /auth/token, /auth/verify   (gateway-owned)    │
//!                 │                                                          │
//!   Client ──────▶│  authenticate ─▶ authorize ─▶ route ─▶ failover select   │
//!                 │   (bearer JWT)   (role/path)  (prefix)  (probe primary)  │
//!                 │                                              │           │
//!                 │                                              ▼           │
//!   Client ◀──────│◀──────────── circuit breaker ◀──── forward ──┴──────────┼──▶ Backend
//!                 │                                                          │
//!                 │  config · observability · admin API · lifecycle          │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::load_config;
use api_gateway::http::HttpServer;
use api_gateway::lifecycle::{signals, Shutdown};
use api_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "api-gateway", version, about = "API gateway with primary/backup failover")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            // the subscriber is not configured yet, so fall back to defaults
            logging::init_logging(&Default::default());
            tracing::error!(path = %args.config.display(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        clients = config.jwt.clients.len(),
        circuit_breaker = config.circuit_breaker.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config.clone()).map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        e
    })?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
