use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use checkrun::control::{
    BoxFuture, ControlEngine, ControlExecutionTree, ExecutionContext, QueryClient, ResultGroup,
    StaticClient,
};
use checkrun::errors::{CheckRunError, Result};
use checkrun::workspace::Workspace;

/// A fake engine that:
/// - records which resources had a tree built and which trees were executed
/// - fails `build_tree` for names registered with `fail_build`
/// - builds empty trees and optionally sleeps while "executing" them.
#[derive(Default)]
pub struct FakeControlEngine {
    failing: HashSet<String>,
    delay: Option<Duration>,
    built: Arc<Mutex<Vec<String>>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FakeControlEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_build(mut self, resource_name: &str) -> Self {
        self.failing.insert(resource_name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn built(&self) -> Vec<String> {
        self.built.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl ControlEngine for FakeControlEngine {
    fn build_tree(
        &self,
        _ctx: &ExecutionContext,
        _workspace: &Arc<dyn Workspace>,
        _client: &Arc<dyn QueryClient>,
        resource_name: &str,
    ) -> Result<ControlExecutionTree> {
        self.built.lock().unwrap().push(resource_name.to_string());

        if self.failing.contains(resource_name) {
            return Err(CheckRunError::ResourceNotFound(resource_name.to_string()));
        }

        Ok(ControlExecutionTree::new(
            ResultGroup::new(resource_name, None, None),
            Arc::new(StaticClient::new()),
        ))
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ExecutionContext,
        tree: &'a ControlExecutionTree,
    ) -> BoxFuture<'a, ()> {
        let executed = Arc::clone(&self.executed);
        let delay = self.delay;

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::select! {
                    _ = ctx.cancellation_token().cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            executed
                .lock()
                .unwrap()
                .push(tree.root().group_id().to_string());
        })
    }
}
