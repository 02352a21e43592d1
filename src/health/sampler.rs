//! Telemetry sampler.
//!
//! Decides whether a change in live heap size is worth a log line. Pure; the
//! dispatch loop does the logging.

/// One mebibyte. Default reporting threshold.
pub const DEFAULT_THRESHOLD_BYTES: u64 = 1024 * 1024;

/// True when `current` differs from `previous` by strictly more than
/// `threshold_bytes`.
pub fn should_log(previous: u64, current: u64, threshold_bytes: u64) -> bool {
    previous.abs_diff(current) > threshold_bytes
}
