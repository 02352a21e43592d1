//! OS interrupt handling.
//!
//! # Responsibilities
//! - Register interest in the interactive interrupt (SIGINT / Ctrl+C) at startup
//! - Translate the interrupt into a `ShutdownRequest::quit(0)`
//! - Hand the request to the dispatch loop on a channel separate from the
//!   shutdown queue
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Registration happens eagerly so a failure aborts startup
//! - Every other signal keeps its default disposition

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::types::{LifecycleError, LifecycleResult, ShutdownRequest};

/// Exit status reported when the process is interrupted.
pub const INTERRUPT_EXIT_CODE: i32 = 0;

/// Adapter between an OS interrupt and the dispatch loop.
///
/// Owns one listener task; the task ends after the first interrupt.
#[derive(Debug)]
pub struct SignalBridge {
    rx: mpsc::Receiver<ShutdownRequest>,
    listener: JoinHandle<()>,
}

impl SignalBridge {
    /// Install the process interrupt handler.
    #[cfg(unix)]
    pub fn install() -> LifecycleResult<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt =
            signal(SignalKind::interrupt()).map_err(LifecycleError::SignalRegistration)?;
        tracing::debug!("SIGINT handler installed");
        Ok(Self::from_notification(async move { interrupt.recv().await }))
    }

    /// Install the process interrupt handler.
    #[cfg(windows)]
    pub fn install() -> LifecycleResult<Self> {
        let mut interrupt =
            tokio::signal::windows::ctrl_c().map_err(LifecycleError::SignalRegistration)?;
        tracing::debug!("Ctrl+C handler installed");
        Ok(Self::from_notification(async move { interrupt.recv().await }))
    }

    /// Build a bridge over any one-shot notification.
    ///
    /// The notification resolves to `Some(())` when the interrupt fires and
    /// `None` when its source is gone for good.
    pub fn from_notification<F>(notification: F) -> Self
    where
        F: Future<Output = Option<()>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let listener = tokio::spawn(async move {
            if notification.await.is_none() {
                tracing::debug!("Interrupt source closed");
                return;
            }
            tracing::warn!("^C detected, interrupt received");
            let _ = tx.send(ShutdownRequest::quit(INTERRUPT_EXIT_CODE)).await;
        });

        Self { rx, listener }
    }

    /// Wait for the synthesized request.
    ///
    /// Returns `None` if the listener ended without seeing an interrupt.
    pub async fn recv(&mut self) -> Option<ShutdownRequest> {
        self.rx.recv().await
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
