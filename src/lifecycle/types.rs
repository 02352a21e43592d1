//! Lifecycle message types and error definitions.

use thiserror::Error;

/// Why a shutdown was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Terminate the process with the carried exit code.
    Quit,
}

/// A request to end the process.
///
/// Immutable once built; the dispatch loop consumes exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownRequest {
    reason: ShutdownReason,
    exit_code: i32,
}

impl ShutdownRequest {
    /// Request termination with the given exit status.
    pub const fn quit(exit_code: i32) -> Self {
        Self {
            reason: ShutdownReason::Quit,
            exit_code,
        }
    }

    pub fn reason(&self) -> ShutdownReason {
        self.reason
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }
}

/// Which event source delivered the terminating request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSource {
    /// Posted by application code through a [`ShutdownHandle`](super::shutdown::ShutdownHandle).
    Requested,
    /// Synthesized by the signal bridge after an OS interrupt.
    Interrupt,
}

impl ShutdownSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownSource::Requested => "requested",
            ShutdownSource::Interrupt => "interrupt",
        }
    }
}

/// Result of a completed dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownOutcome {
    pub request: ShutdownRequest,
    pub source: ShutdownSource,
}

impl ShutdownOutcome {
    /// Process exit status to terminate with.
    pub fn exit_code(&self) -> i32 {
        self.request.exit_code()
    }
}

/// Errors raised by the lifecycle primitives.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A producer overran the bounded shutdown queue.
    #[error("shutdown queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The dispatch loop is gone; nobody will receive the request.
    #[error("shutdown queue closed")]
    QueueClosed,

    /// The interrupt handler could not be installed.
    #[error("failed to register interrupt handler: {0}")]
    SignalRegistration(#[source] std::io::Error),
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
