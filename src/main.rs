//! Visit counter service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                VISIT COUNTER                 │
//!                        │                                              │
//!     Client Request     │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ───────────────────┼─▶│  http   │───▶│ counter  │───▶│  cache  │──┼──▶ Redis
//!                        │  │ server  │    │ (dual)   │    └─────────┘  │
//!                        │  └────┬────┘    │          │    ┌─────────┐  │
//!                        │       │         │          │───▶│ durable │──┼──▶ Postgres
//!                        │       │         └──────────┘    └─────────┘  │
//!                        │       │         ┌──────────┐         ▲       │
//!                        │       └────────▶│  health  │─────────┘       │
//!                        │                 │aggregator│  probes         │
//!                        │                 └──────────┘                 │
//!                        │                                              │
//!                        │  config · observability · lifecycle          │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use visit_counter::config::load_config;
use visit_counter::http::HttpServer;
use visit_counter::lifecycle::{bootstrap, signals, Shutdown};
use visit_counter::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "visit-counter")]
#[command(about = "Visit counter backed by Redis and Postgres", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("visit-counter v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        cache_configured = config.cache.is_some(),
        database_configured = config.database.is_some(),
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let context = bootstrap(config).await;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(context);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
