// src/dashboard/node.rs

//! Run and parent contracts for nodes of the dashboard tree.
//!
//! Children signal completion by pushing themselves onto their parent's
//! completion channel, exactly once each. A parent knows how many children
//! it started and reads until it has received that many signals; it never
//! relies on the channel closing. Channels are sized to the child count, so
//! a push only waits if a parent adds more children than it declared.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::control::{BoxFuture, ExecutionContext};
use crate::errors::{CheckRunError, Result};
use crate::types::RunStatus;

pub type CompletionSender = mpsc::Sender<Arc<dyn DashboardNodeRun>>;
pub type CompletionReceiver = mpsc::Receiver<Arc<dyn DashboardNodeRun>>;

/// Create a completion channel for a parent expecting `expected_children`
/// signals.
pub fn completion_channel(expected_children: usize) -> (CompletionSender, CompletionReceiver) {
    mpsc::channel(expected_children.max(1))
}

/// A node of the dashboard tree that can be executed.
pub trait DashboardNodeRun: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn run_status(&self) -> RunStatus;

    /// Present iff the status is `Error`.
    fn error(&self) -> Option<Arc<CheckRunError>>;

    /// True once the run reached `Complete` or `Error`.
    fn run_complete(&self) -> bool {
        self.run_status().is_terminal()
    }

    fn children_complete(&self) -> bool;

    /// Execute the node until it reaches a terminal status.
    fn execute(self: Arc<Self>, ctx: ExecutionContext) -> BoxFuture<'static, Result<()>>;
}

/// A node that hosts children and receives their completion signals.
pub trait DashboardParent: Send + Sync {
    /// Sender half of this parent's completion channel.
    fn child_complete_tx(&self) -> CompletionSender;
}
