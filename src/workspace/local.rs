// src/workspace/local.rs

use tokio::sync::mpsc;
use tracing::trace;

use crate::dashboard::DashboardEvent;

use super::{ModResources, Workspace};

/// Config-backed workspace.
///
/// Events are forwarded over an unbounded channel so publishing never
/// blocks a run; the receiving half is handed to whoever renders or logs
/// them.
#[derive(Debug)]
pub struct LocalWorkspace {
    resources: ModResources,
    events_tx: mpsc::UnboundedSender<DashboardEvent>,
}

impl LocalWorkspace {
    pub fn new(resources: ModResources) -> (Self, mpsc::UnboundedReceiver<DashboardEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                resources,
                events_tx,
            },
            events_rx,
        )
    }
}

impl Workspace for LocalWorkspace {
    fn publish_dashboard_event(&self, event: DashboardEvent) {
        if let Err(err) = self.events_tx.send(event) {
            trace!(event = err.0.kind(), "no event subscriber; dropping dashboard event");
        }
    }

    fn resources(&self) -> &ModResources {
        &self.resources
    }
}
