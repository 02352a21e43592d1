//! Memory health subsystem.
//!
//! # Data Flow
//! ```text
//! Counting allocator (alloc.rs):
//!     Every alloc/dealloc → process-wide counters
//!
//! Probe (probe.rs):
//!     Fast tick
//!     → Read allocator counters + OS resident size
//!     → MemorySnapshot
//!
//! Sampler (sampler.rs):
//!     |current - last reported| > threshold ?
//!     → dispatch loop logs the snapshot
//! ```
//!
//! # Design Decisions
//! - Sampling is cheap (atomic loads + one process refresh)
//! - The sampler is pure; only the dispatch loop logs
//! - Probes sit behind a trait so the loop can be driven by scripted values

pub mod alloc;
pub mod probe;
pub mod sampler;

pub use probe::{MemoryProbe, MemorySnapshot, ProcessProbe, TelemetryError};
pub use sampler::{should_log, DEFAULT_THRESHOLD_BYTES};
