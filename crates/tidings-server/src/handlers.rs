//! HTTP and WebSocket handlers for the Tidings server.
//!
//! Every WebSocket connection subscribes to exactly one channel, named by the
//! request path: `GET /ws/news:HOME:headline`.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use crate::provider::SnapshotProvider;
use anyhow::Result;
use axum::{
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tidings_core::{session, ContentProvider, Hub, RefreshScheduler, Resolver, TimeoutProvider};
use tidings_transport::{websocket, Connection};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Shared server state.
pub struct AppState {
    /// The broadcast engine.
    pub hub: Arc<Hub>,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config, hub: Arc<Hub>) -> Self {
        Self { hub, config }
    }
}

/// Build the engine from configuration.
#[must_use]
pub fn build_hub(config: &Config) -> Arc<Hub> {
    let snapshot = SnapshotProvider::new(&config.provider.snapshot_path);
    let provider: Arc<dyn ContentProvider> = match config.fetch_timeout() {
        Some(timeout) => Arc::new(TimeoutProvider::new(snapshot, timeout)),
        None => Arc::new(snapshot),
    };

    Arc::new(Hub::with_resolver(
        provider,
        Resolver::new(config.provider.base_url.clone()),
    ))
}

/// Build the HTTP router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&state.config.websocket_route(), get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Run the HTTP/WebSocket server and the refresh scheduler.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let hub = build_hub(&config);
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&hub)));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let scheduler_hub = Arc::clone(&hub);
    RefreshScheduler::new(hub, config.refresh_interval()).spawn(move |report| {
        metrics::record_refresh(report);
        metrics::set_registry_stats(scheduler_hub.registry().stats());
    });

    // Bind and serve
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Tidings server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}/<channel>",
        addr,
        config.transport.websocket_path.trim_end_matches('/')
    );
    info!(
        snapshot = %config.provider.snapshot_path.display(),
        "Serving content from snapshot file"
    );

    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.hub.registry().stats();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "channels": stats.channel_count,
        "subscriptions": stats.total_subscriptions,
    }))
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(channel): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.max_message_size(state.config.limits.max_message_size)
        .on_upgrade(move |socket| handle_websocket(socket, channel, state))
}

/// Handle a WebSocket connection for its whole lifetime.
async fn handle_websocket(socket: WebSocket, channel: String, state: Arc<AppState>) {
    let _metrics_guard = ConnectionMetricsGuard::new();

    let (connection, inbound) = websocket::split(socket);
    let connection_id = connection.id().clone();

    debug!(connection = %connection_id, channel = %channel, "WebSocket connected");

    let outcome = session::run(&state.hub, &channel, connection, inbound, |_| {
        metrics::set_registry_stats(state.hub.registry().stats());
    })
    .await;

    metrics::record_session(outcome);
    metrics::set_registry_stats(state.hub.registry().stats());

    debug!(
        connection = %connection_id,
        channel = %channel,
        outcome = outcome.as_str(),
        "WebSocket disconnected"
    );
}
