use std::sync::{Arc, Mutex};

use checkrun::dashboard::DashboardEvent;
use checkrun::workspace::{ModResources, Workspace};

/// A workspace that keeps every published event in memory.
#[derive(Debug, Default)]
pub struct RecordingWorkspace {
    resources: ModResources,
    events: Arc<Mutex<Vec<DashboardEvent>>>,
}

impl RecordingWorkspace {
    pub fn new(resources: ModResources) -> Self {
        Self {
            resources,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Vec<DashboardEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Events of the given kind (see `DashboardEvent::kind`).
    pub fn events_of_kind(&self, kind: &str) -> Vec<DashboardEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.kind() == kind)
            .collect()
    }

    /// Leaf lifecycle events for the run called `name`.
    pub fn leaf_events_for(&self, name: &str) -> Vec<DashboardEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.leaf_name() == Some(name))
            .collect()
    }
}

impl Workspace for RecordingWorkspace {
    fn publish_dashboard_event(&self, event: DashboardEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn resources(&self) -> &ModResources {
        &self.resources
    }
}
