// src/dashboard/execution_tree.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::control::{ControlEngine, ExecutionContext, QueryClient};
use crate::errors::{CheckRunError, Result};
use crate::types::RunStatus;
use crate::workspace::Workspace;

use super::check_run::CheckRun;
use super::container_run::ContainerRun;
use super::events::DashboardEvent;
use super::node::DashboardNodeRun;

/// Owns the run registry and session identity for one dashboard execution.
///
/// Runs keep only a weak reference back to the tree, so dropping the tree
/// tears the whole execution down.
pub struct DashboardExecutionTree {
    dashboard_name: String,
    session_id: String,
    workspace: Arc<dyn Workspace>,
    client: Arc<dyn QueryClient>,
    engine: Arc<dyn ControlEngine>,
    runs: Mutex<HashMap<String, Arc<dyn DashboardNodeRun>>>,
    root: Mutex<Option<Arc<ContainerRun>>>,
}

impl DashboardExecutionTree {
    pub fn new(
        dashboard_name: impl Into<String>,
        session_id: impl Into<String>,
        workspace: Arc<dyn Workspace>,
        client: Arc<dyn QueryClient>,
        engine: Arc<dyn ControlEngine>,
    ) -> Arc<Self> {
        Arc::new(Self {
            dashboard_name: dashboard_name.into(),
            session_id: session_id.into(),
            workspace,
            client,
            engine,
            runs: Mutex::new(HashMap::new()),
            root: Mutex::new(None),
        })
    }

    pub fn dashboard_name(&self) -> &str {
        &self.dashboard_name
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        &self.workspace
    }

    pub fn client(&self) -> &Arc<dyn QueryClient> {
        &self.client
    }

    pub fn engine(&self) -> &Arc<dyn ControlEngine> {
        &self.engine
    }

    /// Insert a run under `name`. Fails without side effects if the name is
    /// already taken.
    pub(crate) fn register_run(&self, name: &str, run: Arc<dyn DashboardNodeRun>) -> Result<()> {
        let mut runs = self.lock_runs();
        if runs.contains_key(name) {
            return Err(CheckRunError::DuplicateRun(name.to_string()));
        }
        runs.insert(name.to_string(), run);
        Ok(())
    }

    pub fn get_run(&self, name: &str) -> Option<Arc<dyn DashboardNodeRun>> {
        self.lock_runs().get(name).cloned()
    }

    pub fn contains_run(&self, name: &str) -> bool {
        self.lock_runs().contains_key(name)
    }

    /// Registered run names, sorted.
    pub fn run_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock_runs().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn run_count(&self) -> usize {
        self.lock_runs().len()
    }

    pub fn publish(&self, event: DashboardEvent) {
        debug!(
            event = event.kind(),
            session = %self.session_id,
            "publishing dashboard event"
        );
        self.workspace.publish_dashboard_event(event);
    }

    pub fn root(&self) -> Option<Arc<ContainerRun>> {
        self.root
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Create the root container and one check run per dashboard child.
    ///
    /// Children that name an unknown resource still get a run; they fail when
    /// executed. A child that is not a control or benchmark aborts the build.
    pub fn build_dashboard(
        self: &Arc<Self>,
        title: Option<&str>,
        children: &[String],
    ) -> Result<Vec<Arc<CheckRun>>> {
        let root = ContainerRun::new_root(
            self.dashboard_name.clone(),
            title.map(str::to_string),
            children.len(),
            self,
        )?;

        let resources = self.workspace.resources();
        let mut leaves = Vec::with_capacity(children.len());
        for child in children {
            let run = CheckRun::new(resources.leaf_node_or_ref(child), root.as_ref(), self)?;
            root.add_child(run.clone());
            leaves.push(run);
        }

        info!(
            dashboard = %self.dashboard_name,
            session = %self.session_id,
            leaves = leaves.len(),
            "dashboard execution tree built"
        );

        *self.root.lock().unwrap_or_else(PoisonError::into_inner) = Some(root);
        Ok(leaves)
    }

    /// Execute the root container and wait for every run to finish.
    pub async fn execute(self: &Arc<Self>, ctx: &ExecutionContext) -> Result<RunStatus> {
        let root = self.root().ok_or_else(|| {
            CheckRunError::ConfigError(format!(
                "dashboard '{}' has not been built",
                self.dashboard_name
            ))
        })?;

        self.publish(DashboardEvent::ExecutionStarted {
            dashboard: self.dashboard_name.clone(),
            session: self.session_id.clone(),
        });

        let result = Arc::clone(&root).execute(ctx.clone()).await;
        let status = root.run_status();

        self.publish(DashboardEvent::ExecutionComplete {
            dashboard: self.dashboard_name.clone(),
            session: self.session_id.clone(),
            status,
        });

        info!(
            dashboard = %self.dashboard_name,
            session = %self.session_id,
            %status,
            "dashboard execution complete"
        );

        result.map(|()| status)
    }

    fn lock_runs(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn DashboardNodeRun>>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for DashboardExecutionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardExecutionTree")
            .field("dashboard_name", &self.dashboard_name)
            .field("session_id", &self.session_id)
            .field("runs", &self.run_names())
            .finish_non_exhaustive()
    }
}
