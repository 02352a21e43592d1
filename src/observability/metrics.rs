//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_memory_allocated_bytes` (gauge): live heap bytes
//! - `registry_memory_total_allocated_bytes` (gauge): cumulative heap bytes
//! - `registry_memory_system_bytes` (gauge): resident process memory
//! - `registry_uptime_seconds` (gauge): time since start
//! - `registry_telemetry_reports_total` (counter): snapshots written to the log
//! - `registry_maintenance_ticks_total` (counter): slow ticks fired
//! - `registry_shutdown_requests_total` (counter): terminating requests by source
//! - `registry_shutdown_queue_full_total` (counter): rejected enqueues
//!
//! Updates are no-ops until a recorder is installed.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::MemorySnapshot;
use crate::lifecycle::ShutdownSource;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {}", e))?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record the latest memory snapshot.
pub fn record_memory(snapshot: &MemorySnapshot) {
    gauge!("registry_memory_allocated_bytes").set(snapshot.allocated_bytes as f64);
    gauge!("registry_memory_total_allocated_bytes").set(snapshot.total_allocated_bytes as f64);
    gauge!("registry_memory_system_bytes").set(snapshot.system_bytes as f64);
    gauge!("registry_uptime_seconds").set(snapshot.uptime.as_secs_f64());
}

pub fn record_telemetry_report() {
    counter!("registry_telemetry_reports_total").increment(1);
}

pub fn record_maintenance_tick() {
    counter!("registry_maintenance_ticks_total").increment(1);
}

pub fn record_shutdown(source: ShutdownSource) {
    counter!("registry_shutdown_requests_total", "source" => source.as_str()).increment(1);
}

pub fn record_queue_full() {
    counter!("registry_shutdown_queue_full_total").increment(1);
}
