//! Metrics collection and export for Tidings.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tidings_core::{RefreshReport, RegistryStats, SessionOutcome};
use tracing::info;

/// Metric names.
pub mod names {
    pub const CONNECTIONS_TOTAL: &str = "tidings_connections_total";
    pub const CONNECTIONS_ACTIVE: &str = "tidings_connections_active";
    pub const CHANNELS_ACTIVE: &str = "tidings_channels_active";
    pub const SUBSCRIPTIONS_ACTIVE: &str = "tidings_subscriptions_active";
    pub const SESSIONS_TOTAL: &str = "tidings_sessions_total";
    pub const REFRESH_CYCLES_TOTAL: &str = "tidings_refresh_cycles_total";
    pub const REFRESH_SECONDS: &str = "tidings_refresh_seconds";
    pub const REFRESH_DELIVERIES_TOTAL: &str = "tidings_refresh_deliveries_total";
    pub const ERRORS_TOTAL: &str = "tidings_errors_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::CONNECTIONS_TOTAL,
        "Total number of connections since server start"
    );
    metrics::describe_gauge!(
        names::CONNECTIONS_ACTIVE,
        "Current number of active connections"
    );
    metrics::describe_gauge!(names::CHANNELS_ACTIVE, "Current number of non-empty channels");
    metrics::describe_gauge!(
        names::SUBSCRIPTIONS_ACTIVE,
        "Current number of channel subscriptions"
    );
    metrics::describe_counter!(names::SESSIONS_TOTAL, "Completed sessions by handshake outcome");
    metrics::describe_counter!(names::REFRESH_CYCLES_TOTAL, "Completed refresh cycles");
    metrics::describe_histogram!(names::REFRESH_SECONDS, "Refresh cycle duration in seconds");
    metrics::describe_counter!(
        names::REFRESH_DELIVERIES_TOTAL,
        "Data envelopes delivered by refresh cycles"
    );
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of errors");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a new connection.
pub fn record_connection() {
    counter!(names::CONNECTIONS_TOTAL).increment(1);
    gauge!(names::CONNECTIONS_ACTIVE).increment(1.0);
}

/// Record a disconnection.
pub fn record_disconnection() {
    gauge!(names::CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record the end of a session.
pub fn record_session(outcome: SessionOutcome) {
    counter!(names::SESSIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// Update registry gauges.
pub fn set_registry_stats(stats: RegistryStats) {
    gauge!(names::CHANNELS_ACTIVE).set(stats.channel_count as f64);
    gauge!(names::SUBSCRIPTIONS_ACTIVE).set(stats.total_subscriptions as f64);
}

/// Record a completed refresh cycle.
pub fn record_refresh(report: &RefreshReport) {
    counter!(names::REFRESH_CYCLES_TOTAL).increment(1);
    histogram!(names::REFRESH_SECONDS).record(report.duration.as_secs_f64());
    counter!(names::REFRESH_DELIVERIES_TOTAL).increment(report.deliveries as u64);
    if report.failures > 0 {
        record_errors("refresh", report.failures as u64);
    }
}

/// Record errors.
pub fn record_errors(error_type: &'static str, count: u64) {
    counter!(names::ERRORS_TOTAL, "type" => error_type).increment(count);
}

/// Metrics guard that records disconnection on drop.
pub struct ConnectionMetricsGuard;

impl ConnectionMetricsGuard {
    /// Create a new metrics guard, recording a connection.
    #[must_use]
    pub fn new() -> Self {
        record_connection();
        Self
    }
}

impl Default for ConnectionMetricsGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionMetricsGuard {
    fn drop(&mut self) {
        record_disconnection();
    }
}
