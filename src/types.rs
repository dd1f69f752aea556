// src/types.rs

//! Small shared enums and value types.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const BLOCK_TYPE_CONTROL: &str = "control";
pub const BLOCK_TYPE_BENCHMARK: &str = "benchmark";

/// Externally visible status of a run in the dashboard tree.
///
/// There is no `Running` state: a run reports `Ready` until it publishes one
/// of the two terminal statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ready,
    Complete,
    Error,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Error)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Ready => write!(f, "ready"),
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

/// The two resource kinds a check run can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Control,
    Benchmark,
}

impl NodeKind {
    /// Classify a block type. Anything other than `control` or `benchmark`
    /// yields `None`.
    pub fn classify(block_type: &str) -> Option<Self> {
        match block_type {
            BLOCK_TYPE_CONTROL => Some(NodeKind::Control),
            BLOCK_TYPE_BENCHMARK => Some(NodeKind::Benchmark),
            _ => None,
        }
    }

    pub fn block_type(self) -> &'static str {
        match self {
            NodeKind::Control => BLOCK_TYPE_CONTROL,
            NodeKind::Benchmark => BLOCK_TYPE_BENCHMARK,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.block_type())
    }
}

/// Status of a single result row produced by a control query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    Ok,
    Alarm,
    Info,
    Skip,
    Error,
}

/// One row returned by a control query: a resource and its evaluated status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub resource: String,
    pub status: ControlStatus,
    #[serde(default)]
    pub reason: String,
}

/// Split a qualified resource name (`control.s3_versioning`) into its block
/// type and short name.
pub fn split_qualified_name(name: &str) -> Option<(&str, &str)> {
    match name.split_once('.') {
        Some((block_type, short)) if !block_type.is_empty() && !short.is_empty() => {
            Some((block_type, short))
        }
        _ => None,
    }
}
