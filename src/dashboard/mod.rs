// src/dashboard/mod.rs

//! Dashboard execution tree.
//!
//! - [`node`] holds the run/parent traits and the completion channel types.
//! - [`execution_tree`] is the per-session registry every run registers into.
//! - [`check_run`] is the leaf run for controls and benchmarks.
//! - [`container_run`] is the parent node that fans its children back in.
//! - [`control_hooks`] forwards engine progress as dashboard events.
//! - [`events`] defines what gets published to the workspace.

pub mod check_run;
pub mod container_run;
pub mod control_hooks;
pub mod events;
pub mod execution_tree;
pub mod node;

pub use check_run::CheckRun;
pub use container_run::ContainerRun;
pub use control_hooks::ControlEventHooks;
pub use events::DashboardEvent;
pub use execution_tree::DashboardExecutionTree;
pub use node::{
    completion_channel, CompletionReceiver, CompletionSender, DashboardNodeRun, DashboardParent,
};
