// src/control/mod.rs

//! Control evaluation engine.
//!
//! The dashboard layer treats this as an external collaborator reached
//! through the [`ControlEngine`] trait:
//!
//! - [`context`] provides the cancellation-aware [`ExecutionContext`] that
//!   also carries the progress hook target.
//! - [`hooks`] defines [`ControlHooks`] and the [`ControlProgress`] snapshot.
//! - [`result`] holds the result artifact ([`ControlExecutionTree`]).
//! - [`client`] abstracts query execution ([`QueryClient`]).
//! - [`engine`] is the production [`LocalControlEngine`].
//!
//! Tests can swap in their own `ControlEngine` that never touches a client.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub mod client;
pub mod context;
pub mod engine;
pub mod hooks;
pub mod result;

pub use client::{QueryClient, StaticClient};
pub use context::ExecutionContext;
pub use engine::LocalControlEngine;
pub use hooks::{ControlHooks, ControlProgress, NoopControlHooks};
pub use result::{ControlExecutionTree, ControlRun, ResultGroup, StatusSummary};

use crate::errors::Result;
use crate::workspace::Workspace;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Builds and runs evaluation trees for controls and benchmarks.
pub trait ControlEngine: Send + Sync {
    /// Build the evaluation plan for a qualified control or benchmark name.
    ///
    /// Failure here is the only failure a leaf run reports as its own error.
    fn build_tree(
        &self,
        ctx: &ExecutionContext,
        workspace: &Arc<dyn Workspace>,
        client: &Arc<dyn QueryClient>,
        resource_name: &str,
    ) -> Result<ControlExecutionTree>;

    /// Evaluate every control in `tree`, reporting progress to the hooks in
    /// `ctx`.
    ///
    /// Per-control failures are recorded inside the tree; this never fails.
    fn execute<'a>(
        &'a self,
        ctx: &'a ExecutionContext,
        tree: &'a ControlExecutionTree,
    ) -> BoxFuture<'a, ()>;
}
