//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacity and intervals bounded on both sides)
//! - Check that strings parse (filter directive, socket address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::schema::ServerConfig;

/// Largest accepted shutdown queue depth.
pub const MAX_QUEUE_CAPACITY: usize = 1024;

/// Largest accepted tick interval: one year.
pub const MAX_TICK_SECS: u64 = 365 * 24 * 60 * 60;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.logging.file.trim().is_empty() {
        errors.push(ValidationError::new(
            "logging.file",
            "must be a path or \"-\"",
        ));
    }
    if EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::new(
            "logging.level",
            format!("{:?} is not a valid filter directive", config.logging.level),
        ));
    }

    if !(1..=MAX_QUEUE_CAPACITY).contains(&config.lifecycle.queue_capacity) {
        errors.push(ValidationError::new(
            "lifecycle.queue_capacity",
            format!("must be between 1 and {}", MAX_QUEUE_CAPACITY),
        ));
    }
    if !(1..=MAX_TICK_SECS).contains(&config.lifecycle.fast_tick_secs) {
        errors.push(ValidationError::new(
            "lifecycle.fast_tick_secs",
            format!("must be between 1 and {}", MAX_TICK_SECS),
        ));
    }
    if !(1..=MAX_TICK_SECS).contains(&config.lifecycle.slow_tick_secs) {
        errors.push(ValidationError::new(
            "lifecycle.slow_tick_secs",
            format!("must be between 1 and {}", MAX_TICK_SECS),
        ));
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "metrics.address",
            format!("{:?} is not a socket address", config.metrics.address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = ServerConfig::default();
        config.lifecycle.queue_capacity = 0;
        config.lifecycle.fast_tick_secs = 0;
        config.lifecycle.slow_tick_secs = 0;
        config.logging.file = "  ".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "logging.file",
                "lifecycle.queue_capacity",
                "lifecycle.fast_tick_secs",
                "lifecycle.slow_tick_secs",
            ]
        );
    }

    #[test]
    fn test_oversized_lifecycle_values_rejected() {
        let mut config = ServerConfig::default();
        config.lifecycle.queue_capacity = 1 << 62;
        config.lifecycle.fast_tick_secs = i64::MAX as u64;
        config.lifecycle.slow_tick_secs = MAX_TICK_SECS + 1;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "lifecycle.queue_capacity",
                "lifecycle.fast_tick_secs",
                "lifecycle.slow_tick_secs",
            ]
        );
    }

    #[test]
    fn test_lifecycle_upper_bounds_inclusive() {
        let mut config = ServerConfig::default();
        config.lifecycle.queue_capacity = MAX_QUEUE_CAPACITY;
        config.lifecycle.fast_tick_secs = MAX_TICK_SECS;
        config.lifecycle.slow_tick_secs = MAX_TICK_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.metrics.address = "not-an-address".to_string();
        assert!(validate_config(&config).is_ok());

        config.metrics.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "metrics.address");
    }

    #[test]
    fn test_bad_level_rejected() {
        let mut config = ServerConfig::default();
        config.logging.level = "registry_server=loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "logging.level");
    }
}
