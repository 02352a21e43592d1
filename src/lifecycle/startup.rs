//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the interrupt handler before anything else can fail silently
//! - Start the optional metrics exporter
//! - Build the dispatcher that owns the rest of the process lifetime
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The log sink is opened by the caller first so startup errors are logged
//! - The loop only starts once every prerequisite is in place

use std::net::SocketAddr;

use thiserror::Error;
use tokio::time::Instant;

use crate::config::{ConfigError, ServerConfig};
use crate::health::{ProcessProbe, TelemetryError};
use crate::lifecycle::dispatch::{DispatchSettings, Dispatcher};
use crate::lifecycle::signals::SignalBridge;
use crate::lifecycle::types::LifecycleError;
use crate::observability::logging::LoggingError;
use crate::observability::metrics;

/// Anything that prevents the dispatch loop from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("lifecycle: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("telemetry: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("metrics: {0}")]
    Metrics(String),
}

/// Wire up everything the dispatch loop needs.
///
/// `started` is when the process came up; reported uptime counts from it.
/// Must be called from within a Tokio runtime.
pub fn prepare(config: &ServerConfig, started: Instant) -> Result<Dispatcher, StartupError> {
    let interrupts = SignalBridge::install()?;

    if config.metrics.enabled {
        let addr: SocketAddr = config.metrics.address.parse().map_err(|_| {
            StartupError::Metrics(format!("invalid address {:?}", config.metrics.address))
        })?;
        metrics::init_metrics(addr).map_err(StartupError::Metrics)?;
    }

    let probe = ProcessProbe::new()?;
    let settings = DispatchSettings::from(config);

    tracing::info!(
        fast_tick_secs = settings.fast_tick.as_secs(),
        slow_tick_secs = settings.slow_tick.as_secs(),
        threshold_bytes = settings.threshold_bytes,
        queue_capacity = settings.queue_capacity,
        "Dispatcher configured"
    );

    Ok(Dispatcher::new(settings, Box::new(probe))
        .with_start_time(started)
        .with_interrupts(interrupts))
}
