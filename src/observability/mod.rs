//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch loop produces:
//!     → logging.rs (startup, telemetry and shutdown records)
//!     → metrics.rs (memory gauges, lifecycle counters)
//!
//! Consumers:
//!     → stderr + log file
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (text or JSON)
//! - Metrics are cheap (atomic increments) and inert without a recorder

pub mod logging;
pub mod metrics;
