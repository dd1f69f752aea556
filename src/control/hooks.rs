// src/control/hooks.rs

use serde::Serialize;

use super::result::{ControlRun, StatusSummary};

/// Snapshot of evaluation progress for one execution tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControlProgress {
    pub total: usize,
    pub pending: usize,
    pub executing: usize,
    pub complete: usize,
    pub error: usize,
    pub summary: StatusSummary,
}

impl ControlProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            pending: total,
            ..Self::default()
        }
    }

    pub fn on_control_start(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        self.executing += 1;
    }

    pub fn on_control_complete(&mut self, summary: &StatusSummary) {
        self.executing = self.executing.saturating_sub(1);
        self.complete += 1;
        self.summary.merge(summary);
    }

    /// A control that failed after starting.
    pub fn on_control_error(&mut self) {
        self.executing = self.executing.saturating_sub(1);
        self.error += 1;
    }

    /// A control that failed before it started (e.g. cancelled while queued).
    pub fn on_control_skipped(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        self.error += 1;
    }

    pub fn finished(&self) -> usize {
        self.complete + self.error
    }
}

/// Receives incremental progress from the engine.
///
/// All methods default to doing nothing.
pub trait ControlHooks: Send + Sync {
    fn on_start(&self, _progress: &ControlProgress) {}

    fn on_control_start(&self, _control: &ControlRun, _progress: &ControlProgress) {}

    fn on_control_complete(&self, _control: &ControlRun, _progress: &ControlProgress) {}

    fn on_control_error(&self, _control: &ControlRun, _progress: &ControlProgress) {}

    fn on_done(&self, _progress: &ControlProgress) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopControlHooks;

impl ControlHooks for NoopControlHooks {}
