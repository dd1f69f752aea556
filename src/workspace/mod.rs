// src/workspace/mod.rs

//! Workspace collaborator.
//!
//! The workspace owns the resources a dashboard can reference and is the
//! sink for every dashboard event. The execution tree holds it by
//! reference; nothing in the dashboard layer owns it.
//!
//! - [`resource`] defines control/benchmark/panel definitions and the
//!   [`DashboardLeafNode`] descriptor trait.
//! - [`local`] is a config-backed workspace that forwards events over a
//!   Tokio channel.

use std::fmt;

pub mod local;
pub mod resource;

pub use local::LocalWorkspace;
pub use resource::{
    BenchmarkDefinition, ControlDefinition, DashboardLeafNode, ModResources, PanelDefinition,
    ResourceRef,
};

use crate::dashboard::DashboardEvent;

/// Everything the dashboard layer needs from the workspace.
pub trait Workspace: Send + Sync + fmt::Debug {
    /// Publish a dashboard event. Must not block.
    fn publish_dashboard_event(&self, event: DashboardEvent);

    /// Resources loaded into this workspace.
    fn resources(&self) -> &ModResources;
}
