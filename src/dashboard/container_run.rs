// src/dashboard/container_run.rs

//! Parent node that runs its children concurrently and fans their
//! completion signals back in.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::control::{BoxFuture, ExecutionContext};
use crate::errors::{CheckRunError, Result};
use crate::types::RunStatus;

use super::events::DashboardEvent;
use super::execution_tree::DashboardExecutionTree;
use super::node::{
    completion_channel, CompletionReceiver, CompletionSender, DashboardNodeRun, DashboardParent,
};

#[derive(Debug)]
struct ContainerState {
    status: RunStatus,
    error: Option<Arc<CheckRunError>>,
    children: Vec<Arc<dyn DashboardNodeRun>>,
    /// Taken by `execute`; a container runs once.
    child_complete_rx: Option<CompletionReceiver>,
}

pub struct ContainerRun {
    name: String,
    title: Option<String>,
    state: Mutex<ContainerState>,
    child_complete_tx: CompletionSender,
    parent_tx: Option<CompletionSender>,
    tree: Weak<DashboardExecutionTree>,
}

impl ContainerRun {
    /// Create and register a container with no parent (the dashboard root).
    ///
    /// `expected_children` sizes the completion channel.
    pub fn new_root(
        name: impl Into<String>,
        title: Option<String>,
        expected_children: usize,
        tree: &Arc<DashboardExecutionTree>,
    ) -> Result<Arc<Self>> {
        Self::build(name.into(), title, expected_children, None, tree)
    }

    /// Create and register a container nested under `parent`.
    pub fn new(
        name: impl Into<String>,
        title: Option<String>,
        expected_children: usize,
        parent: &dyn DashboardParent,
        tree: &Arc<DashboardExecutionTree>,
    ) -> Result<Arc<Self>> {
        Self::build(
            name.into(),
            title,
            expected_children,
            Some(parent.child_complete_tx()),
            tree,
        )
    }

    fn build(
        name: String,
        title: Option<String>,
        expected_children: usize,
        parent_tx: Option<CompletionSender>,
        tree: &Arc<DashboardExecutionTree>,
    ) -> Result<Arc<Self>> {
        let (child_complete_tx, child_complete_rx) = completion_channel(expected_children);
        let run = Arc::new(Self {
            name,
            title,
            state: Mutex::new(ContainerState {
                status: RunStatus::Ready,
                error: None,
                children: Vec::with_capacity(expected_children),
                child_complete_rx: Some(child_complete_rx),
            }),
            child_complete_tx,
            parent_tx,
            tree: Arc::downgrade(tree),
        });

        tree.register_run(&run.name, run.clone())?;
        debug!(container = %run.name, expected_children, "container registered");
        Ok(run)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Add a child. The child must have been constructed with this container
    /// as its parent.
    pub fn add_child(&self, child: Arc<dyn DashboardNodeRun>) {
        self.lock_state().children.push(child);
    }

    pub fn children(&self) -> Vec<Arc<dyn DashboardNodeRun>> {
        self.lock_state().children.clone()
    }

    async fn execute_container(self: Arc<Self>, ctx: ExecutionContext) -> Result<()> {
        let (children, rx) = {
            let mut state = self.lock_state();
            (state.children.clone(), state.child_complete_rx.take())
        };
        let mut rx = rx.ok_or_else(|| {
            CheckRunError::Other(anyhow::anyhow!(
                "container '{}' has already been executed",
                self.name
            ))
        })?;

        let expected = children.len();
        info!(container = %self.name, children = expected, "executing container");

        let mut tasks = JoinSet::new();
        for child in children {
            let ctx = ctx.clone();
            tasks.spawn(async move {
                let name = child.name().to_string();
                if let Err(err) = child.execute(ctx).await {
                    debug!(run = %name, error = %err, "child execution returned an error");
                }
                name
            });
        }

        // One signal per child. A child whose task panics, or ends without
        // having pushed itself, never signals and is counted as lost.
        let mut fan_in = FanIn::new(&self.name, expected);
        let mut tasks_open = true;

        while !fan_in.is_done() {
            tokio::select! {
                signal = rx.recv() => {
                    let Some(child) = signal else {
                        return Err(CheckRunError::CompletionChannelClosed(self.name.clone()));
                    };
                    fan_in.record_signal(child);
                }
                joined = tasks.join_next(), if tasks_open => {
                    match joined {
                        Some(Ok(name)) => {
                            // A child pushes before its task ends, so its
                            // signal is already buffered if it sent one.
                            while let Ok(child) = rx.try_recv() {
                                fan_in.record_signal(child);
                            }
                            if !fan_in.has_signalled(&name) {
                                fan_in.record_lost(anyhow::anyhow!(
                                    "child '{name}' of '{}' finished without signalling",
                                    self.name
                                ));
                            }
                        }
                        Some(Err(err)) if err.is_panic() => {
                            fan_in.record_lost(anyhow::anyhow!(
                                "a child of '{}' panicked: {err}",
                                self.name
                            ));
                        }
                        Some(Err(_)) => {}
                        None => tasks_open = false,
                    }
                }
            }
        }

        let first_error = fan_in.into_first_error();
        match first_error {
            Some(err) => self.set_error(err).await,
            None => self.set_complete().await,
        }
    }

    /// # Panics
    ///
    /// If the container already reached a terminal status.
    pub async fn set_error(self: &Arc<Self>, err: Arc<CheckRunError>) -> Result<()> {
        self.transition(RunStatus::Error, Some(Arc::clone(&err)));
        warn!(container = %self.name, error = %err, "container finished with errors");
        self.publish(|session| DashboardEvent::ContainerError {
            container: self.name.clone(),
            session,
            error: err,
        });
        self.notify_parent().await
    }

    /// # Panics
    ///
    /// If the container already reached a terminal status.
    pub async fn set_complete(self: &Arc<Self>) -> Result<()> {
        self.transition(RunStatus::Complete, None);
        info!(container = %self.name, "container complete");
        self.publish(|session| DashboardEvent::ContainerComplete {
            container: self.name.clone(),
            session,
        });
        self.notify_parent().await
    }

    fn transition(&self, next: RunStatus, error: Option<Arc<CheckRunError>>) {
        let mut state = self.lock_state();
        let current = state.status;
        if current.is_terminal() {
            drop(state);
            panic!(
                "container '{}' is already {current}; it cannot become {next}",
                self.name
            );
        }
        state.status = next;
        state.error = error;
    }

    fn publish(&self, make: impl FnOnce(String) -> DashboardEvent) {
        match self.tree.upgrade() {
            Some(tree) => tree.publish(make(tree.session_id().to_string())),
            None => warn!(container = %self.name, "execution tree dropped; event not published"),
        }
    }

    async fn notify_parent(self: &Arc<Self>) -> Result<()> {
        let Some(parent_tx) = &self.parent_tx else {
            return Ok(());
        };
        let me: Arc<dyn DashboardNodeRun> = self.clone();
        parent_tx
            .send(me)
            .await
            .map_err(|_| CheckRunError::CompletionChannelClosed(self.name.clone()))
    }

    fn lock_state(&self) -> MutexGuard<'_, ContainerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Completion-count bookkeeping for one `execute` of a container.
struct FanIn<'a> {
    container: &'a str,
    expected: usize,
    signalled: HashSet<String>,
    lost: usize,
    first_error: Option<Arc<CheckRunError>>,
}

impl<'a> FanIn<'a> {
    fn new(container: &'a str, expected: usize) -> Self {
        Self {
            container,
            expected,
            signalled: HashSet::with_capacity(expected),
            lost: 0,
            first_error: None,
        }
    }

    fn is_done(&self) -> bool {
        self.signalled.len() + self.lost >= self.expected
    }

    fn has_signalled(&self, name: &str) -> bool {
        self.signalled.contains(name)
    }

    fn record_signal(&mut self, child: Arc<dyn DashboardNodeRun>) {
        if !self.signalled.insert(child.name().to_string()) {
            warn!(container = %self.container, child = %child.name(), "duplicate completion signal ignored");
            return;
        }
        debug!(
            container = %self.container,
            child = %child.name(),
            status = %child.run_status(),
            received = self.signalled.len(),
            expected = self.expected,
            "child complete"
        );
        if child.run_status() == RunStatus::Error && self.first_error.is_none() {
            self.first_error = child.error();
        }
    }

    fn record_lost(&mut self, reason: anyhow::Error) {
        self.lost += 1;
        warn!(container = %self.container, error = %reason, "child lost");
        if self.first_error.is_none() {
            self.first_error = Some(Arc::new(CheckRunError::Other(reason)));
        }
    }

    fn into_first_error(self) -> Option<Arc<CheckRunError>> {
        self.first_error
    }
}

impl DashboardParent for ContainerRun {
    fn child_complete_tx(&self) -> CompletionSender {
        self.child_complete_tx.clone()
    }
}

impl DashboardNodeRun for ContainerRun {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_status(&self) -> RunStatus {
        self.lock_state().status
    }

    fn error(&self) -> Option<Arc<CheckRunError>> {
        self.lock_state().error.clone()
    }

    fn children_complete(&self) -> bool {
        self.lock_state()
            .children
            .iter()
            .all(|child| child.run_complete())
    }

    fn execute(self: Arc<Self>, ctx: ExecutionContext) -> BoxFuture<'static, Result<()>> {
        Box::pin(self.execute_container(ctx))
    }
}

impl fmt::Debug for ContainerRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("ContainerRun")
            .field("name", &self.name)
            .field("status", &state.status)
            .field("children", &state.children.len())
            .finish_non_exhaustive()
    }
}
