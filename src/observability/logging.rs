//! Structured logging.
//!
//! # Responsibilities
//! - Open the log sink: stderr, plus an append-only file unless disabled
//! - Pick text or JSON output
//! - Apply the configured level, overridable through `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Timestamps are UTC
//! - Failing to open the log file is fatal; the caller aborts startup

use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::schema::{LogFormat, LoggingConfig, STDERR_ONLY};

/// Boxed formatting layer for subscriber `S`.
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Errors while setting up the log sink.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid log filter {0:?}")]
    Filter(String),

    #[error("logging already initialized: {0}")]
    Init(String),
}

/// Open the log file for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::OpenFile {
            path: path.display().to_string(),
            source,
        })
}

fn format_layer<S>(format: LogFormat, ansi: bool, writer: BoxMakeWriter) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed(),
    }
}

/// Build one layer per sink.
///
/// stderr gets colour only when it is a terminal; the file never does.
pub fn fmt_layers<S>(config: &LoggingConfig) -> Result<Vec<BoxedLayer<S>>, LoggingError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let mut layers = vec![format_layer(
        config.format,
        std::io::stderr().is_terminal(),
        BoxMakeWriter::new(std::io::stderr),
    )];

    if config.file != STDERR_ONLY {
        let file = open_log_file(Path::new(&config.file))?;
        layers.push(format_layer(
            config.format,
            false,
            BoxMakeWriter::new(Mutex::new(file)),
        ));
    }

    Ok(layers)
}

/// Resolve the level filter: `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|_| LoggingError::Filter(config.level.clone())),
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = env_filter(config)?;
    let layers = fmt_layers(config)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;

    fn config(file: &str, format: LogFormat) -> LoggingConfig {
        LoggingConfig {
            file: file.to_string(),
            level: "info".to_string(),
            format,
        }
    }

    fn temp_log(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("registry-server-{}-{}.log", name, std::process::id()))
    }

    #[test]
    fn test_stderr_only_skips_file() {
        let layers = fmt_layers::<Registry>(&config(STDERR_ONLY, LogFormat::Text)).unwrap();
        assert_eq!(layers.len(), 1);
    }

    #[test]
    fn test_unopenable_file_is_an_error() {
        let err = fmt_layers::<Registry>(&config("/nonexistent-dir/registry/server.log", LogFormat::Text))
            .err().unwrap();
        assert!(matches!(err, LoggingError::OpenFile { .. }));
    }

    #[test]
    fn test_file_sink_is_plain_text() {
        let path = temp_log("plain");
        let _ = std::fs::remove_file(&path);

        let layers = fmt_layers(&config(path.to_str().unwrap(), LogFormat::Text)).unwrap();
        assert_eq!(layers.len(), 2);
        let subscriber = tracing_subscriber::registry().with(layers);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(exit_code = 0, "Exiting");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Exiting"));
        assert!(content.contains("exit_code=0"));
        assert!(!content.contains("\x1b["));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_log_file_is_appended() {
        let path = temp_log("append");
        std::fs::write(&path, b"existing\n").unwrap();

        {
            use std::io::Write;
            let mut file = open_log_file(&path).unwrap();
            file.write_all(b"appended\n").unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "existing\nappended\n");
        std::fs::remove_file(&path).unwrap();
    }
}
