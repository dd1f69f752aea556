// src/logging.rs

//! Subscriber setup for the `checkrun` binary.
//!
//! The filter comes from the first of:
//! 1. `--log-level`, applied to every target;
//! 2. `CHECKRUN_LOG`, parsed as `EnvFilter` directives, so
//!    `CHECKRUN_LOG=warn,checkrun::dashboard=debug` works;
//! 3. `info`.
//!
//! Output goes to stderr; stdout is reserved for the run report.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

const LOG_ENV: &str = "CHECKRUN_LOG";

/// Install the global subscriber. Call once, before `run`.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => match std::env::var(LOG_ENV) {
            Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
                .with_context(|| format!("invalid {LOG_ENV} value '{directives}'"))?,
            _ => EnvFilter::new("info"),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("logging already initialised: {err}"))
}
