// src/errors.rs

//! Crate-wide error type and result alias.

use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckRunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A leaf run was asked to wrap something that is neither a control nor a
    /// benchmark.
    #[error("check run instantiated with invalid node type '{block_type}' (resource '{name}')")]
    InvalidNodeType { name: String, block_type: String },

    #[error("a run named '{0}' is already registered in this execution tree")]
    DuplicateRun(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// The parent stopped draining its completion channel.
    #[error("completion channel closed before '{0}' could signal its parent")]
    CompletionChannelClosed(String),

    #[error("execution tree dropped while '{0}' was still in use")]
    ExecutionTreeDropped(String),

    /// Returned from `execute` when a run reaches the `Error` status. The
    /// source is the same value recorded on the run and published with the
    /// leaf error event.
    #[error("run '{name}' failed: {source}")]
    RunFailed {
        name: String,
        #[source]
        source: Arc<CheckRunError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CheckRunError>;
