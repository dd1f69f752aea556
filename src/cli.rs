// src/cli.rs

//! Command-line surface of the `checkrun` binary.

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "checkrun",
    version,
    about = "Execute the control and benchmark panels of a compliance dashboard.",
    long_about = None
)]
pub struct CliArgs {
    /// Dashboard definition to execute.
    #[arg(long, value_name = "PATH", default_value = "Checkrun.toml")]
    pub config: String,

    /// Session identifier attached to every published dashboard event.
    #[arg(long, value_name = "ID", default_value = "cli")]
    pub session_id: String,

    /// Overrides `CHECKRUN_LOG` for every target.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and list the dashboard's panels without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// How to print the final report.
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive accepted by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
