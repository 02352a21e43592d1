//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Install SIGINT handler → Metrics exporter → Build dispatcher
//!
//! Dispatch (dispatch.rs):
//!     Initial snapshot → wait on { queue, interrupt, fast tick, slow tick }
//!     → first shutdown request → ShutdownOutcome → main exits with its code
//!
//! Shutdown queue (shutdown.rs):
//!     Any task → ShutdownHandle::quit(code) → bounded FIFO → dispatch loop
//!
//! Signals (signals.rs):
//!     SIGINT → ShutdownRequest::quit(0) → dispatch loop
//! ```
//!
//! # Design Decisions
//! - Ordered startup: log sink, interrupt handler, then the loop
//! - Termination is immediate; there is no drain phase
//! - Only the first shutdown request observed has any effect

pub mod dispatch;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod types;

pub use dispatch::{DispatchSettings, Dispatcher, Maintenance, MaintenanceError, NoMaintenance};
pub use shutdown::{shutdown_queue, ShutdownHandle, ShutdownQueue};
pub use signals::SignalBridge;
pub use types::{LifecycleError, ShutdownOutcome, ShutdownReason, ShutdownRequest, ShutdownSource};
