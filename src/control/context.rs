// src/control/context.rs

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::hooks::{ControlHooks, NoopControlHooks};

/// Execution context threaded through every `execute` call.
///
/// Cloning is cheap. A derived context shares the cancellation token of the
/// context it came from.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    cancel: CancellationToken,
    hooks: Option<Arc<dyn ControlHooks>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            hooks: None,
        }
    }

    /// Derive a context whose progress is reported to `hooks`.
    pub fn with_control_hooks(&self, hooks: Arc<dyn ControlHooks>) -> Self {
        Self {
            cancel: self.cancel.clone(),
            hooks: Some(hooks),
        }
    }

    /// The installed hook target, or a no-op if none was installed.
    pub fn control_hooks(&self) -> Arc<dyn ControlHooks> {
        match &self.hooks {
            Some(hooks) => Arc::clone(hooks),
            None => Arc::new(NoopControlHooks),
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("has_hooks", &self.hooks.is_some())
            .finish()
    }
}
