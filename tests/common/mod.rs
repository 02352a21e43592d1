//! Shared utilities for dispatch loop integration tests.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use registry_server::health::{MemoryProbe, MemorySnapshot, TelemetryError};
use registry_server::lifecycle::{Maintenance, MaintenanceError};
use serde_json::Value;
use tracing_subscriber::fmt::MakeWriter;

pub const MIB: u64 = 1024 * 1024;

/// Probe that replays a fixed allocation script.
///
/// `None` entries fail the sample. Once the script runs out the last entry
/// repeats.
pub struct ScriptedProbe {
    script: VecDeque<Option<u64>>,
    last: Option<u64>,
    samples: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedProbe {
    pub fn new(script: Vec<Option<u64>>) -> (Self, Arc<Mutex<Vec<Duration>>>) {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let probe = Self {
            script: script.into(),
            last: Some(0),
            samples: samples.clone(),
        };
        (probe, samples)
    }

    /// Probe that always reports the same allocation.
    pub fn constant(allocated_bytes: u64) -> (Self, Arc<Mutex<Vec<Duration>>>) {
        Self::new(vec![Some(allocated_bytes)])
    }
}

impl MemoryProbe for ScriptedProbe {
    fn sample(&mut self, uptime: Duration) -> Result<MemorySnapshot, TelemetryError> {
        self.samples.lock().unwrap().push(uptime);

        let next = match self.script.pop_front() {
            Some(entry) => {
                self.last = entry;
                entry
            }
            None => self.last,
        };

        match next {
            Some(allocated_bytes) => Ok(MemorySnapshot {
                allocated_bytes,
                total_allocated_bytes: allocated_bytes * 2,
                system_bytes: 64 * MIB,
                reclaims: 3,
                uptime,
            }),
            None => Err(TelemetryError::Other("scripted failure".into())),
        }
    }
}

/// Maintenance hook that counts invocations and optionally fails.
pub struct CountingMaintenance {
    runs: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingMaintenance {
    pub fn new(fail: bool) -> (Self, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (
            Self {
                runs: runs.clone(),
                fail,
            },
            runs,
        )
    }
}

impl Maintenance for CountingMaintenance {
    fn perform(&mut self) -> Result<(), MaintenanceError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err("resource unavailable".into())
        } else {
            Ok(())
        }
    }
}

/// In-memory JSON log sink.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

pub struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buf: self.buf.clone(),
        }
    }
}

impl CapturedLogs {
    /// Route this thread's events into the capture buffer until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn records(&self) -> Vec<Value> {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Messages of every record, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.records()
            .iter()
            .filter_map(|r| r["fields"]["message"].as_str().map(str::to_string))
            .collect()
    }

    /// Records whose message is `message`.
    pub fn with_message(&self, message: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r["fields"]["message"] == message)
            .collect()
    }

    pub fn count(&self, message: &str) -> usize {
        self.with_message(message).len()
    }
}
