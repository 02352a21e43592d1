//! Shutdown request queue.
//!
//! Bounded FIFO carrying [`ShutdownRequest`]s from any task to the dispatch
//! loop. Producers never block: a full queue is reported back as
//! [`LifecycleError::QueueFull`] and logged as an error.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::lifecycle::types::{LifecycleError, LifecycleResult, ShutdownRequest};
use crate::observability::metrics;

/// Default queue depth. A handful of legitimate producers never get near it.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Create a shutdown queue with the given capacity.
///
/// # Panics
/// Panics if `capacity` is zero; configuration validation rejects that value.
pub fn shutdown_queue(capacity: usize) -> (ShutdownHandle, ShutdownQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (ShutdownHandle { tx, capacity }, ShutdownQueue { rx })
}

/// Producer side. Cheap to clone and hand to any task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::Sender<ShutdownRequest>,
    capacity: usize,
}

impl ShutdownHandle {
    /// Enqueue a request without waiting.
    pub fn request(&self, request: ShutdownRequest) -> LifecycleResult<()> {
        match self.tx.try_send(request) {
            Ok(()) => {
                tracing::debug!(exit_code = request.exit_code(), "Shutdown request queued");
                Ok(())
            }
            Err(TrySendError::Full(rejected)) => {
                metrics::record_queue_full();
                tracing::error!(
                    exit_code = rejected.exit_code(),
                    capacity = self.capacity,
                    "Shutdown queue full; a producer is enqueuing more requests than the loop can ever act on"
                );
                Err(LifecycleError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Closed(_)) => Err(LifecycleError::QueueClosed),
        }
    }

    /// Shorthand for `request(ShutdownRequest::quit(exit_code))`.
    pub fn quit(&self, exit_code: i32) -> LifecycleResult<()> {
        self.request(ShutdownRequest::quit(exit_code))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer side, owned by the dispatch loop.
#[derive(Debug)]
pub struct ShutdownQueue {
    rx: mpsc::Receiver<ShutdownRequest>,
}

impl ShutdownQueue {
    /// Wait for the next request, oldest first.
    ///
    /// Returns `None` only once every handle has been dropped.
    pub async fn receive(&mut self) -> Option<ShutdownRequest> {
        self.rx.recv().await
    }
}
