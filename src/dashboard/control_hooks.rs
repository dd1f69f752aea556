// src/dashboard/control_hooks.rs

use std::sync::Arc;

use tracing::debug;

use crate::control::{ControlHooks, ControlProgress, ControlRun};

use super::check_run::CheckRun;
use super::events::DashboardEvent;
use super::node::DashboardNodeRun;

/// Reports engine progress for a [`CheckRun`] as dashboard events.
#[derive(Debug)]
pub struct ControlEventHooks {
    run: Arc<CheckRun>,
}

impl ControlEventHooks {
    pub fn new(run: Arc<CheckRun>) -> Self {
        Self { run }
    }
}

impl ControlHooks for ControlEventHooks {
    fn on_start(&self, progress: &ControlProgress) {
        debug!(run = %self.run.name(), total = progress.total, "control execution started");
    }

    fn on_control_complete(&self, control: &ControlRun, progress: &ControlProgress) {
        self.run.publish(|session| DashboardEvent::ControlComplete {
            run: self.run.name().to_string(),
            control: control.control_id().to_string(),
            progress: progress.clone(),
            session,
        });
    }

    fn on_control_error(&self, control: &ControlRun, progress: &ControlProgress) {
        self.run.publish(|session| DashboardEvent::ControlError {
            run: self.run.name().to_string(),
            control: control.control_id().to_string(),
            error: control.state().error,
            progress: progress.clone(),
            session,
        });
    }

    fn on_done(&self, progress: &ControlProgress) {
        debug!(
            run = %self.run.name(),
            complete = progress.complete,
            errors = progress.error,
            "control execution done"
        );
    }
}
