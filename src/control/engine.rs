// src/control/engine.rs

//! Production control engine.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{CheckRunError, Result};
use crate::types::{split_qualified_name, BLOCK_TYPE_BENCHMARK, BLOCK_TYPE_CONTROL};
use crate::workspace::{ModResources, Workspace};

use super::client::QueryClient;
use super::context::ExecutionContext;
use super::hooks::{ControlHooks, ControlProgress};
use super::result::{ControlExecutionTree, ControlRun, ResultGroup};
use super::{BoxFuture, ControlEngine};

/// Builds evaluation trees from workspace resources and evaluates controls
/// through a [`QueryClient`], at most `max_parallel` at a time.
#[derive(Debug, Clone)]
pub struct LocalControlEngine {
    max_parallel: usize,
}

impl LocalControlEngine {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }
}

impl Default for LocalControlEngine {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ControlEngine for LocalControlEngine {
    fn build_tree(
        &self,
        _ctx: &ExecutionContext,
        workspace: &Arc<dyn Workspace>,
        client: &Arc<dyn QueryClient>,
        resource_name: &str,
    ) -> Result<ControlExecutionTree> {
        let resources = workspace.resources();
        let mut path = Vec::new();
        let root = build_group(resources, resource_name, &mut path)?;

        debug!(
            resource = %resource_name,
            controls = root.all_control_runs().len(),
            "built control execution tree"
        );

        Ok(ControlExecutionTree::new(root, Arc::clone(client)))
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ExecutionContext,
        tree: &'a ControlExecutionTree,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let hooks = ctx.control_hooks();
            let controls = tree.control_runs();
            let progress = Arc::new(Mutex::new(ControlProgress::new(controls.len())));

            hooks.on_start(&snapshot(&progress));
            info!(
                root = %tree.root().group_id(),
                controls = controls.len(),
                max_parallel = self.max_parallel,
                "executing controls"
            );

            let semaphore = Arc::new(Semaphore::new(self.max_parallel));
            let mut tasks = JoinSet::new();

            for control in controls {
                let job = ControlJob {
                    control,
                    client: Arc::clone(tree.client()),
                    hooks: Arc::clone(&hooks),
                    cancel: ctx.cancellation_token().clone(),
                    progress: Arc::clone(&progress),
                };
                let semaphore = Arc::clone(&semaphore);
                tasks.spawn(async move { job.run(semaphore).await });
            }

            while let Some(joined) = tasks.join_next().await {
                if let Err(err) = joined {
                    warn!(error = %err, "control task did not finish cleanly");
                }
            }

            let done = snapshot(&progress);
            info!(
                root = %tree.root().group_id(),
                complete = done.complete,
                errors = done.error,
                ok = done.summary.ok,
                alarm = done.summary.alarm,
                "control execution finished"
            );
            hooks.on_done(&done);
        })
    }
}

/// Resolve `name` into a result group. `path` holds the benchmarks currently
/// being expanded so cycles are rejected.
fn build_group(
    resources: &ModResources,
    name: &str,
    path: &mut Vec<String>,
) -> Result<ResultGroup> {
    match split_qualified_name(name) {
        Some((BLOCK_TYPE_CONTROL, _)) => {
            let control = resources
                .control(name)
                .ok_or_else(|| CheckRunError::ResourceNotFound(name.to_string()))?;
            let mut group = ResultGroup::new(
                name,
                control.title.clone(),
                control.description.clone(),
            );
            group.add_control_run(Arc::new(ControlRun::new(control)));
            Ok(group)
        }
        Some((BLOCK_TYPE_BENCHMARK, _)) => {
            let benchmark = resources
                .benchmark(name)
                .ok_or_else(|| CheckRunError::ResourceNotFound(name.to_string()))?;

            if path.iter().any(|p| p == name) {
                return Err(CheckRunError::InvalidResource(format!(
                    "benchmark '{name}' contains itself"
                )));
            }
            path.push(name.to_string());

            let mut group = ResultGroup::new(
                name,
                benchmark.title.clone(),
                benchmark.description.clone(),
            );
            for child in &benchmark.children {
                match split_qualified_name(child) {
                    Some((BLOCK_TYPE_CONTROL, _)) => {
                        let control = resources.control(child).ok_or_else(|| {
                            CheckRunError::InvalidResource(format!(
                                "benchmark '{name}' references missing control '{child}'"
                            ))
                        })?;
                        group.add_control_run(Arc::new(ControlRun::new(control)));
                    }
                    Some((BLOCK_TYPE_BENCHMARK, _)) => {
                        if resources.benchmark(child).is_none() {
                            return Err(CheckRunError::InvalidResource(format!(
                                "benchmark '{name}' references missing benchmark '{child}'"
                            )));
                        }
                        group.add_group(build_group(resources, child, path)?);
                    }
                    _ => {
                        return Err(CheckRunError::InvalidResource(format!(
                            "benchmark '{name}' has child '{child}' that is not a control or benchmark"
                        )));
                    }
                }
            }

            path.pop();
            Ok(group)
        }
        _ => Err(CheckRunError::InvalidResource(format!(
            "'{name}' is not a control or benchmark"
        ))),
    }
}

/// Everything one spawned control evaluation needs.
struct ControlJob {
    control: Arc<ControlRun>,
    client: Arc<dyn QueryClient>,
    hooks: Arc<dyn ControlHooks>,
    cancel: CancellationToken,
    progress: Arc<Mutex<ControlProgress>>,
}

impl ControlJob {
    async fn run(self, semaphore: Arc<Semaphore>) {
        let permit = tokio::select! {
            permit = semaphore.acquire_owned() => permit,
            _ = self.cancel.cancelled() => {
                self.fail_before_start("execution cancelled");
                return;
            }
        };
        let _permit = match permit {
            Ok(permit) => permit,
            Err(_) => {
                self.fail_before_start("control scheduler closed");
                return;
            }
        };

        if self.cancel.is_cancelled() {
            self.fail_before_start("execution cancelled");
            return;
        }

        let started = update(&self.progress, ControlProgress::on_control_start);
        self.hooks.on_control_start(&self.control, &started);
        debug!(control = %self.control.control_id(), "control started");

        let result = tokio::select! {
            rows = self.client.execute_control(self.control.definition(), &self.cancel) => rows,
            _ = self.cancel.cancelled() => Err(anyhow::anyhow!("execution cancelled")),
        };

        match result {
            Ok(rows) => {
                let summary = self.control.set_rows(rows);
                let progress = update(&self.progress, |p| p.on_control_complete(&summary));
                debug!(
                    control = %self.control.control_id(),
                    ok = summary.ok,
                    alarm = summary.alarm,
                    "control complete"
                );
                self.hooks.on_control_complete(&self.control, &progress);
            }
            Err(err) => {
                self.control.set_error(format!("{err:#}"));
                let progress = update(&self.progress, ControlProgress::on_control_error);
                warn!(control = %self.control.control_id(), error = %err, "control failed");
                self.hooks.on_control_error(&self.control, &progress);
            }
        }
    }

    fn fail_before_start(&self, reason: &str) {
        self.control.set_error(reason);
        let progress = update(&self.progress, ControlProgress::on_control_skipped);
        debug!(control = %self.control.control_id(), reason, "control not started");
        self.hooks.on_control_error(&self.control, &progress);
    }
}

/// Apply `f` under the lock and return a snapshot, so hooks run unlocked.
fn update(
    progress: &Mutex<ControlProgress>,
    f: impl FnOnce(&mut ControlProgress),
) -> ControlProgress {
    let mut guard = progress.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
    guard.clone()
}

fn snapshot(progress: &Mutex<ControlProgress>) -> ControlProgress {
    progress
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
