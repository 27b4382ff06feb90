//! # Tidings Server
//!
//! Pushes periodically refreshed news channels to live WebSocket clients.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! tidings
//!
//! # Run with a custom config file
//! TIDINGS_CONFIG=/path/to/tidings.toml tidings
//!
//! # Run with environment overrides
//! TIDINGS_PORT=8000 TIDINGS_HOST=0.0.0.0 TIDINGS_REFRESH__INTERVAL_SECS=120 tidings
//! ```
//!
//! Clients connect to `ws://<host>:<port>/ws/<channel>`, e.g.
//! `ws://localhost:8000/ws/news:HOME:headline`.

mod config;
mod handlers;
mod metrics;
mod provider;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "tidings=debug,tidings_core=debug,tidings_transport=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!("Starting Tidings server on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
