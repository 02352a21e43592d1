//! Registry server (v1)
//!
//! Long-running process that owns its own lifecycle.
//! Variables in a `.env` file in the working directory are loaded into the
//! environment before anything else (e.g. `RUST_LOG`).
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                       REGISTRY SERVER                        │
//!   │                                                              │
//!   │  main: CLI → config → log sink → startup::prepare            │
//!   │                                        │                     │
//!   │                                        ▼                     │
//!   │   ShutdownHandle ──▶ ┌──────────────────────────┐            │
//!   │   (any task)         │      dispatch loop       │            │
//!   │                      │  queue | SIGINT | ticks  │──▶ exit(code)
//!   │   SIGINT ──▶ bridge ─▶└───────────┬──────────────┘            │
//!   │                                   │ fast tick                │
//!   │                                   ▼                          │
//!   │                      probe → sampler → "Stats" log line      │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tokio::time::Instant;

use registry_server::config::{load_config, ServerConfig};
use registry_server::health::alloc::CountingAllocator;
use registry_server::lifecycle::startup::{self, StartupError};
use registry_server::observability::logging::init_logging;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator::system();

/// Exit status used when the process cannot start.
const STARTUP_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "registry-server")]
#[command(about = "Registry server process", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Built-in defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log file ('-' for only stderr). Overrides logging.file.
    #[arg(long, value_name = "FILE")]
    log: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let started = Instant::now();
    let cli = Cli::parse();

    let code = match start(cli, started).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("registry-server: {}", e);
            tracing::error!(error = %e, "Startup failed");
            STARTUP_FAILURE
        }
    };
    process::exit(code);
}

async fn start(cli: Cli, started: Instant) -> Result<i32, StartupError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(log) = cli.log {
        config.logging.file = log;
    }

    init_logging(&config.logging)?;
    tracing::info!("Starting up...");

    let dispatcher = startup::prepare(&config, started)?;
    let outcome = dispatcher.run().await;
    Ok(outcome.exit_code())
}
