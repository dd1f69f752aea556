// src/dashboard/events.rs

use std::sync::Arc;

use crate::control::ControlProgress;
use crate::errors::CheckRunError;
use crate::types::RunStatus;

use super::node::DashboardNodeRun;

/// Events published to the workspace while a dashboard executes.
///
/// Every event carries the session id of the execution tree that raised it.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    ExecutionStarted {
        dashboard: String,
        session: String,
    },
    /// A leaf run finished evaluating.
    LeafNodeComplete {
        leaf_node: Arc<dyn DashboardNodeRun>,
        session: String,
    },
    /// A leaf run could not attempt evaluation.
    LeafNodeError {
        leaf_node: Arc<dyn DashboardNodeRun>,
        session: String,
        error: Arc<CheckRunError>,
    },
    /// Progress: one control inside a leaf run finished.
    ControlComplete {
        run: String,
        control: String,
        progress: ControlProgress,
        session: String,
    },
    /// Progress: one control inside a leaf run failed.
    ControlError {
        run: String,
        control: String,
        error: Option<String>,
        progress: ControlProgress,
        session: String,
    },
    ContainerComplete {
        container: String,
        session: String,
    },
    ContainerError {
        container: String,
        session: String,
        error: Arc<CheckRunError>,
    },
    ExecutionComplete {
        dashboard: String,
        session: String,
        status: RunStatus,
    },
}

impl DashboardEvent {
    pub fn session(&self) -> &str {
        match self {
            DashboardEvent::ExecutionStarted { session, .. }
            | DashboardEvent::LeafNodeComplete { session, .. }
            | DashboardEvent::LeafNodeError { session, .. }
            | DashboardEvent::ControlComplete { session, .. }
            | DashboardEvent::ControlError { session, .. }
            | DashboardEvent::ContainerComplete { session, .. }
            | DashboardEvent::ContainerError { session, .. }
            | DashboardEvent::ExecutionComplete { session, .. } => session,
        }
    }

    /// Stable snake_case name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardEvent::ExecutionStarted { .. } => "execution_started",
            DashboardEvent::LeafNodeComplete { .. } => "leaf_node_complete",
            DashboardEvent::LeafNodeError { .. } => "leaf_node_error",
            DashboardEvent::ControlComplete { .. } => "control_complete",
            DashboardEvent::ControlError { .. } => "control_error",
            DashboardEvent::ContainerComplete { .. } => "container_complete",
            DashboardEvent::ContainerError { .. } => "container_error",
            DashboardEvent::ExecutionComplete { .. } => "execution_complete",
        }
    }

    /// Name of the run a leaf lifecycle event refers to.
    pub fn leaf_name(&self) -> Option<&str> {
        match self {
            DashboardEvent::LeafNodeComplete { leaf_node, .. }
            | DashboardEvent::LeafNodeError { leaf_node, .. } => Some(leaf_node.name()),
            _ => None,
        }
    }
}
