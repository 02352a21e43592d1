//! Memory snapshots.
//!
//! # Responsibilities
//! - Define the snapshot taken on every fast tick
//! - Read heap counters from the counting allocator
//! - Read resident process memory from the OS

use std::time::Duration;

use sysinfo::{Pid, System};
use thiserror::Error;

use crate::health::alloc::allocator_stats;

const MIB: u64 = 1024 * 1024;

/// Memory usage at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemorySnapshot {
    /// Live heap bytes.
    pub allocated_bytes: u64,
    /// Cumulative heap bytes allocated since start.
    pub total_allocated_bytes: u64,
    /// Memory the OS reports as resident for this process.
    pub system_bytes: u64,
    /// Deallocations performed since start.
    pub reclaims: u64,
    /// Time since the process started.
    pub uptime: Duration,
}

impl MemorySnapshot {
    pub fn allocated_mib(&self) -> u64 {
        self.allocated_bytes / MIB
    }

    pub fn total_allocated_mib(&self) -> u64 {
        self.total_allocated_bytes / MIB
    }

    pub fn system_mib(&self) -> u64 {
        self.system_bytes / MIB
    }

    pub fn uptime_hours(&self) -> f64 {
        self.uptime.as_secs_f64() / 3600.0
    }
}

/// Errors while sampling memory usage.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The OS no longer reports this process.
    #[error("process {0} not visible to the OS probe")]
    ProcessUnavailable(u32),

    /// The current process id could not be determined.
    #[error("cannot determine current pid: {0}")]
    Pid(&'static str),

    /// Any other probe-specific failure.
    #[error("memory probe failed: {0}")]
    Other(String),
}

/// Source of memory snapshots.
pub trait MemoryProbe: Send {
    /// Take a fresh snapshot stamped with `uptime`.
    fn sample(&mut self, uptime: Duration) -> Result<MemorySnapshot, TelemetryError>;
}

/// Probe backed by the counting allocator and the OS process table.
pub struct ProcessProbe {
    system: System,
    pid: Pid,
}

impl ProcessProbe {
    pub fn new() -> Result<Self, TelemetryError> {
        let pid = sysinfo::get_current_pid().map_err(TelemetryError::Pid)?;
        Ok(Self {
            system: System::new(),
            pid,
        })
    }

    fn resident_bytes(&mut self) -> Result<u64, TelemetryError> {
        if !self.system.refresh_process(self.pid) {
            return Err(TelemetryError::ProcessUnavailable(self.pid.as_u32()));
        }
        self.system
            .process(self.pid)
            .map(|process| process.memory())
            .ok_or(TelemetryError::ProcessUnavailable(self.pid.as_u32()))
    }
}

impl MemoryProbe for ProcessProbe {
    fn sample(&mut self, uptime: Duration) -> Result<MemorySnapshot, TelemetryError> {
        let stats = allocator_stats();
        let system_bytes = self.resident_bytes()?;

        Ok(MemorySnapshot {
            allocated_bytes: stats.allocated_bytes,
            total_allocated_bytes: stats.total_allocated_bytes,
            system_bytes,
            reclaims: stats.reclaims,
            uptime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        let snapshot = MemorySnapshot {
            allocated_bytes: 3 * MIB + 12,
            total_allocated_bytes: 40 * MIB,
            system_bytes: MIB - 1,
            reclaims: 9,
            uptime: Duration::from_secs(5400),
        };
        assert_eq!(snapshot.allocated_mib(), 3);
        assert_eq!(snapshot.total_allocated_mib(), 40);
        assert_eq!(snapshot.system_mib(), 0);
        assert!((snapshot.uptime_hours() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_process_probe_reports_resident_memory() {
        let mut probe = ProcessProbe::new().unwrap();
        let snapshot = probe.sample(Duration::from_secs(1)).unwrap();
        assert!(snapshot.system_bytes > 0);
        assert_eq!(snapshot.uptime, Duration::from_secs(1));
    }
}
