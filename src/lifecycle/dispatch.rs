//! Process dispatch loop.
//!
//! # States
//! - Running: waiting on the shutdown queue, the interrupt bridge and two timers
//! - Terminated: a shutdown request was observed; `run` returns
//!
//! # State Transitions
//! ```text
//! start            → log initial snapshot → Running
//! Running ─fast───→ sample memory, log if |Δalloc| > threshold → Running
//! Running ─slow───→ maintenance hook → Running
//! Running ─request→ Terminated (exit code from the request)
//! Running ─SIGINT─→ Terminated (exit code 0)
//! ```
//!
//! # Design Decisions
//! - One task owns all loop state; nothing here is shared or locked
//! - The wait is biased: queue, interrupt, fast tick, slow tick. The queue is
//!   FIFO, so the first request enqueued is the one acted on, and a queued
//!   request beats a simultaneous interrupt
//! - Returning the outcome ends the loop, so later requests are never seen
//! - Probe and maintenance failures are logged and the loop keeps running

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::ServerConfig;
use crate::health::{should_log, MemoryProbe, MemorySnapshot, DEFAULT_THRESHOLD_BYTES};
use crate::lifecycle::shutdown::{shutdown_queue, ShutdownHandle, ShutdownQueue, DEFAULT_QUEUE_CAPACITY};
use crate::lifecycle::signals::SignalBridge;
use crate::lifecycle::types::{ShutdownOutcome, ShutdownRequest, ShutdownSource};
use crate::observability::metrics;

/// Error type returned by maintenance hooks.
pub type MaintenanceError = Box<dyn std::error::Error + Send + Sync>;

/// Work run on every slow tick.
///
/// Reserved for periodic upkeep of external resources.
pub trait Maintenance: Send {
    fn perform(&mut self) -> Result<(), MaintenanceError>;
}

/// Maintenance hook that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMaintenance;

impl Maintenance for NoMaintenance {
    fn perform(&mut self) -> Result<(), MaintenanceError> {
        Ok(())
    }
}

/// Timing and sizing for the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub fast_tick: Duration,
    pub slow_tick: Duration,
    pub threshold_bytes: u64,
    pub queue_capacity: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            fast_tick: Duration::from_secs(60),
            slow_tick: Duration::from_secs(15 * 60),
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl From<&ServerConfig> for DispatchSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            fast_tick: Duration::from_secs(config.lifecycle.fast_tick_secs),
            slow_tick: Duration::from_secs(config.lifecycle.slow_tick_secs),
            threshold_bytes: config.telemetry.threshold_bytes,
            queue_capacity: config.lifecycle.queue_capacity,
        }
    }
}

/// State private to the loop.
#[derive(Debug)]
struct LoopState {
    start_time: Instant,
    last_reported_allocation: u64,
}

impl LoopState {
    fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            last_reported_allocation: 0,
        }
    }

    fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Decide whether `snapshot` gets reported. The baseline moves only when
    /// it does.
    fn observe(&mut self, snapshot: &MemorySnapshot, threshold_bytes: u64) -> bool {
        if should_log(
            self.last_reported_allocation,
            snapshot.allocated_bytes,
            threshold_bytes,
        ) {
            self.last_reported_allocation = snapshot.allocated_bytes;
            true
        } else {
            false
        }
    }

    fn mark_reported(&mut self, snapshot: &MemorySnapshot) {
        self.last_reported_allocation = snapshot.allocated_bytes;
    }
}

/// Owner of the process lifecycle.
///
/// Built once at startup; `run` consumes it and returns when the first
/// shutdown request is observed.
pub struct Dispatcher {
    settings: DispatchSettings,
    handle: ShutdownHandle,
    queue: ShutdownQueue,
    interrupts: Option<SignalBridge>,
    probe: Box<dyn MemoryProbe>,
    maintenance: Box<dyn Maintenance>,
    state: LoopState,
}

impl Dispatcher {
    /// Create a dispatcher. Uptime is measured from this call unless
    /// `with_start_time` moves it back.
    ///
    /// # Panics
    /// Panics if `settings.queue_capacity` is zero or a tick interval is zero.
    pub fn new(settings: DispatchSettings, probe: Box<dyn MemoryProbe>) -> Self {
        let (handle, queue) = shutdown_queue(settings.queue_capacity);
        Self {
            settings,
            handle,
            queue,
            interrupts: None,
            probe,
            maintenance: Box::new(NoMaintenance),
            state: LoopState::new(Instant::now()),
        }
    }

    /// Measure uptime from `start` (normally process start).
    pub fn with_start_time(mut self, start: Instant) -> Self {
        self.state.start_time = start;
        self
    }

    /// Also terminate on OS interrupts delivered through `bridge`.
    pub fn with_interrupts(mut self, bridge: SignalBridge) -> Self {
        self.interrupts = Some(bridge);
        self
    }

    /// Replace the slow-tick maintenance hook.
    pub fn with_maintenance(mut self, maintenance: Box<dyn Maintenance>) -> Self {
        self.maintenance = maintenance;
        self
    }

    /// Handle for posting shutdown requests from other tasks.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Drive the process until the first shutdown request.
    pub async fn run(self) -> ShutdownOutcome {
        let Dispatcher {
            settings,
            handle: _handle,
            mut queue,
            mut interrupts,
            mut probe,
            mut maintenance,
            mut state,
        } = self;

        match probe.sample(state.uptime()) {
            Ok(snapshot) => {
                metrics::record_memory(&snapshot);
                report(&snapshot);
                state.mark_reported(&snapshot);
            }
            Err(e) => tracing::warn!(error = %e, "Initial memory sample failed"),
        }

        let now = Instant::now();
        let mut fast = time::interval_at(now + settings.fast_tick, settings.fast_tick);
        fast.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut slow = time::interval_at(now + settings.slow_tick, settings.slow_tick);
        slow.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                Some(request) = queue.receive() => {
                    return terminate(request, ShutdownSource::Requested);
                }
                Some(request) = next_interrupt(&mut interrupts) => {
                    return terminate(request, ShutdownSource::Interrupt);
                }
                _ = fast.tick() => {
                    on_fast_tick(&mut state, probe.as_mut(), settings.threshold_bytes);
                }
                _ = slow.tick() => {
                    on_slow_tick(maintenance.as_mut());
                }
            }
        }
    }
}

async fn next_interrupt(bridge: &mut Option<SignalBridge>) -> Option<ShutdownRequest> {
    match bridge {
        Some(bridge) => bridge.recv().await,
        None => std::future::pending().await,
    }
}

fn on_fast_tick(state: &mut LoopState, probe: &mut dyn MemoryProbe, threshold_bytes: u64) {
    let snapshot = match probe.sample(state.uptime()) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(error = %e, "Memory sample failed");
            return;
        }
    };

    metrics::record_memory(&snapshot);
    if state.observe(&snapshot, threshold_bytes) {
        report(&snapshot);
    } else {
        tracing::trace!(alloc_bytes = snapshot.allocated_bytes, "Memory change below threshold");
    }
}

fn on_slow_tick(maintenance: &mut dyn Maintenance) {
    metrics::record_maintenance_tick();
    if let Err(e) = maintenance.perform() {
        tracing::warn!(error = %e, "Scheduled maintenance failed");
    }
}

fn report(snapshot: &MemorySnapshot) {
    metrics::record_telemetry_report();
    tracing::info!(
        alloc_mib = snapshot.allocated_mib(),
        total_alloc_mib = snapshot.total_allocated_mib(),
        sys_mib = snapshot.system_mib(),
        reclaims = snapshot.reclaims,
        uptime_hrs = snapshot.uptime_hours(),
        "Stats"
    );
}

fn terminate(request: ShutdownRequest, source: ShutdownSource) -> ShutdownOutcome {
    metrics::record_shutdown(source);
    match source {
        ShutdownSource::Interrupt => tracing::info!(exit_code = request.exit_code(), "Interrupt received"),
        ShutdownSource::Requested => tracing::info!(exit_code = request.exit_code(), "Shutdown requested"),
    }
    tracing::info!(exit_code = request.exit_code(), "Exiting");
    ShutdownOutcome { request, source }
}
