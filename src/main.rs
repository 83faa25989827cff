//! Prerender Gateway
//!
//! Serves prerendered HTML to bots in front of a client-rendered application.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                  PRERENDER GATEWAY                    │
//!                      │                                                       │
//!    Client Request    │  ┌──────────┐    ┌────────────┐                       │
//!    ──────────────────┼─▶│  http    │───▶│  routing   │── browser ──────────┐ │
//!                      │  │ server   │    │ bot rules  │                     │ │
//!                      │  └──────────┘    └─────┬──────┘                     ▼ │
//!                      │                        │ bot              ┌──────────┐│
//!                      │                        ▼                  │  origin  ││──▶ App
//!                      │                 ┌────────────┐            │ forwarder││
//!                      │                 │  adapter   │            └──────────┘│
//!                      │                 │ guard/view │                        │
//!                      │                 └──┬──────┬──┘                        │
//!                      │         rendered   │      │ declined                  │
//!                      │                    ▼      ▼                           │
//!                      │            ┌─────────┐ ┌──────────┐                   │
//!                      │            │ render  │ │ fallback │───────────────────┼──▶ App
//!                      │            │ client  │ │  fetch   │                   │
//!                      │            └────┬────┘ └──────────┘                   │
//!                      └─────────────────┼─────────────────────────────────────┘
//!                                        ▼
//!                                 Prerender service
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use prerender_gateway::config::{load_config, validation::validate_config, GatewayConfig};
use prerender_gateway::lifecycle::{wait_for_signal, Shutdown};
use prerender_gateway::observability::{logging, metrics};
use prerender_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "prerender-gateway")]
#[command(about = "Serve prerendered pages to bots in front of a client-rendered app", long_about = None)]
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
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("config error: {}", error);
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    logging::init_logging(&config.observability);

    tracing::info!("prerender-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.origin.url,
        service_url = %config.prerender.service_url,
        mount_path = %config.adapter.mount_path,
        s_maxage_secs = config.adapter.s_maxage_secs,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
