//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive `Deserialize` so they can be read from config files.

use serde::Deserialize;

use crate::health::DEFAULT_THRESHOLD_BYTES;
use crate::lifecycle::shutdown::DEFAULT_QUEUE_CAPACITY;

/// Log file value that disables the file sink.
pub const STDERR_ONLY: &str = "-";

#[cfg(windows)]
const DEFAULT_LOG_FILE: &str = "c:\\temp\\ch_registry_server.log";
#[cfg(not(windows))]
const DEFAULT_LOG_FILE: &str = "/tmp/ch_registry_server.log";

/// Root configuration for the server process.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Log sink settings.
    pub logging: LoggingConfig,

    /// Dispatch loop timing and queue sizing.
    pub lifecycle: LifecycleConfig,

    /// Memory telemetry settings.
    pub telemetry: TelemetryConfig,

    /// Prometheus exporter settings.
    pub metrics: MetricsConfig,
}

/// Output format for log records.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file path, appended to. `"-"` logs to stderr only.
    pub file: String,

    /// Default filter directive (trace, debug, info, warn, error).
    pub level: String,

    /// Text or JSON records.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_LOG_FILE.to_string(),
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Dispatch loop configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Shutdown queue depth.
    pub queue_capacity: usize,

    /// Health tick interval in seconds.
    pub fast_tick_secs: u64,

    /// Maintenance tick interval in seconds.
    pub slow_tick_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            fast_tick_secs: 60,
            slow_tick_secs: 15 * 60,
        }
    }
}

/// Memory telemetry configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Minimum heap change, in bytes, before a snapshot is logged again.
    pub threshold_bytes: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
        }
    }
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus scrape endpoint.
    pub enabled: bool,

    /// Scrape endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:9090".to_string(),
        }
    }
}
