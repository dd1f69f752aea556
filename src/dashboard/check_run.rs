// src/dashboard/check_run.rs

//! Leaf run for a control or benchmark panel.
//!
//! Lifecycle:
//!
//! ```text
//! new() ──► Ready ──execute()──► Complete
//!                        └─────► Error     (evaluation tree could not be built)
//! ```
//!
//! Each terminal transition happens once, publishes one leaf event and
//! pushes the run onto its parent's completion channel once. A second
//! transition is a bug in the caller and panics.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::control::{BoxFuture, ControlExecutionTree, ExecutionContext};
use crate::errors::{CheckRunError, Result};
use crate::types::{NodeKind, RunStatus};
use crate::workspace::DashboardLeafNode;

use super::control_hooks::ControlEventHooks;
use super::events::DashboardEvent;
use super::execution_tree::DashboardExecutionTree;
use super::node::{CompletionSender, DashboardNodeRun, DashboardParent};

#[derive(Debug)]
struct LeafState {
    status: RunStatus,
    error: Option<Arc<CheckRunError>>,
    execution_tree: Option<Arc<ControlExecutionTree>>,
}

pub struct CheckRun {
    name: String,
    title: Option<String>,
    width: Option<u32>,
    kind: NodeKind,
    dashboard_name: String,
    resource: Arc<dyn DashboardLeafNode>,
    state: Mutex<LeafState>,
    parent_tx: CompletionSender,
    tree: Weak<DashboardExecutionTree>,
}

impl CheckRun {
    /// Classify `resource`, then register a `Ready` run in `tree`.
    ///
    /// Nothing is registered when classification or registration fails.
    pub fn new(
        resource: Arc<dyn DashboardLeafNode>,
        parent: &dyn DashboardParent,
        tree: &Arc<DashboardExecutionTree>,
    ) -> Result<Arc<Self>> {
        // Node names are unique within a dashboard, so the resource name
        // doubles as the run name.
        let name = resource.name().to_string();
        let kind = NodeKind::classify(resource.block_type()).ok_or_else(|| {
            CheckRunError::InvalidNodeType {
                name: name.clone(),
                block_type: resource.block_type().to_string(),
            }
        })?;

        let run = Arc::new(Self {
            name,
            title: resource.title().map(str::to_string),
            width: resource.width(),
            kind,
            dashboard_name: tree.dashboard_name().to_string(),
            resource,
            state: Mutex::new(LeafState {
                status: RunStatus::Ready,
                error: None,
                execution_tree: None,
            }),
            parent_tx: parent.child_complete_tx(),
            tree: Arc::downgrade(tree),
        });

        tree.register_run(&run.name, run.clone())?;
        debug!(run = %run.name, kind = %run.kind, "check run registered");

        Ok(run)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn node_type(&self) -> &'static str {
        self.kind.block_type()
    }

    pub fn dashboard_name(&self) -> &str {
        &self.dashboard_name
    }

    pub fn resource(&self) -> &Arc<dyn DashboardLeafNode> {
        &self.resource
    }

    /// Result artifact; set once the engine built an evaluation tree.
    pub fn execution_tree(&self) -> Option<Arc<ControlExecutionTree>> {
        self.lock_state().execution_tree.clone()
    }

    /// Record `err`, publish a leaf error event and signal the parent.
    ///
    /// # Panics
    ///
    /// If the run already reached a terminal status.
    pub async fn set_error(self: &Arc<Self>, err: Arc<CheckRunError>) -> Result<()> {
        self.transition(RunStatus::Error, Some(Arc::clone(&err)));
        warn!(run = %self.name, error = %err, "check run failed");

        self.publish(|session| DashboardEvent::LeafNodeError {
            leaf_node: self.clone(),
            session,
            error: err,
        });
        self.notify_parent().await
    }

    /// Mark the run complete, publish a leaf complete event and signal the
    /// parent.
    ///
    /// # Panics
    ///
    /// If the run already reached a terminal status.
    pub async fn set_complete(self: &Arc<Self>) -> Result<()> {
        self.transition(RunStatus::Complete, None);
        info!(run = %self.name, "check run complete");

        self.publish(|session| DashboardEvent::LeafNodeComplete {
            leaf_node: self.clone(),
            session,
        });
        self.notify_parent().await
    }

    async fn execute_leaf(self: Arc<Self>, ctx: ExecutionContext) -> Result<()> {
        let Some(tree) = self.tree.upgrade() else {
            let err = CheckRunError::ExecutionTreeDropped(self.name.clone());
            return self.fail(err).await;
        };

        let built = tree
            .engine()
            .build_tree(&ctx, tree.workspace(), tree.client(), &self.name);
        let execution_tree = match built {
            Ok(execution_tree) => Arc::new(execution_tree),
            Err(err) => return self.fail(err).await,
        };

        let ctx = ctx.with_control_hooks(Arc::new(ControlEventHooks::new(Arc::clone(&self))));
        self.lock_state().execution_tree = Some(Arc::clone(&execution_tree));

        // Per-control failures live in the result tree; the run itself
        // completes once the engine returns.
        tree.engine().execute(&ctx, &execution_tree).await;

        self.set_complete().await
    }

    /// Move to `Error` with `err` and hand the same error back to the caller.
    async fn fail(self: &Arc<Self>, err: CheckRunError) -> Result<()> {
        let err = Arc::new(err);
        if let Err(notify_err) = self.set_error(Arc::clone(&err)).await {
            warn!(run = %self.name, error = %notify_err, "could not signal parent");
        }
        Err(CheckRunError::RunFailed {
            name: self.name.clone(),
            source: err,
        })
    }

    /// Publish an event built from the tree's session id. Events are dropped
    /// with a warning if the tree is gone.
    pub(crate) fn publish(&self, make: impl FnOnce(String) -> DashboardEvent) {
        match self.tree.upgrade() {
            Some(tree) => tree.publish(make(tree.session_id().to_string())),
            None => warn!(run = %self.name, "execution tree dropped; event not published"),
        }
    }

    fn transition(&self, next: RunStatus, error: Option<Arc<CheckRunError>>) {
        let mut state = self.lock_state();
        let current = state.status;
        if current.is_terminal() {
            drop(state);
            panic!(
                "check run '{}' is already {current}; it cannot become {next}",
                self.name
            );
        }
        state.status = next;
        state.error = error;
    }

    async fn notify_parent(self: &Arc<Self>) -> Result<()> {
        let me: Arc<dyn DashboardNodeRun> = self.clone();
        self.parent_tx
            .send(me)
            .await
            .map_err(|_| CheckRunError::CompletionChannelClosed(self.name.clone()))?;
        debug!(run = %self.name, "signalled parent");
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, LeafState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DashboardNodeRun for CheckRun {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_status(&self) -> RunStatus {
        self.lock_state().status
    }

    fn error(&self) -> Option<Arc<CheckRunError>> {
        self.lock_state().error.clone()
    }

    /// A leaf has no children of its own.
    fn children_complete(&self) -> bool {
        self.run_complete()
    }

    fn execute(self: Arc<Self>, ctx: ExecutionContext) -> BoxFuture<'static, Result<()>> {
        Box::pin(self.execute_leaf(ctx))
    }
}

impl fmt::Debug for CheckRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRun")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("dashboard_name", &self.dashboard_name)
            .field("state", &*self.lock_state())
            .finish_non_exhaustive()
    }
}

impl Serialize for CheckRun {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            title: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            width: Option<u32>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<String>,
            status: RunStatus,
            node_type: &'static str,
            execution_tree: Option<&'a ControlExecutionTree>,
            dashboard: &'a str,
        }

        let (status, error, execution_tree) = {
            let state = self.lock_state();
            (
                state.status,
                state.error.as_ref().map(|e| e.to_string()),
                state.execution_tree.clone(),
            )
        };

        View {
            name: &self.name,
            title: self.title(),
            width: self.width,
            error,
            status,
            node_type: self.node_type(),
            execution_tree: execution_tree.as_deref(),
            dashboard: &self.dashboard_name,
        }
        .serialize(serializer)
    }
}
