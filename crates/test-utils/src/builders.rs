#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use checkrun::config::{
    BenchmarkConfig, ConfigFile, ConfigSection, ControlConfig, DashboardConfig, PanelConfig,
    RawConfigFile,
};
use checkrun::control::{ControlEngine, QueryClient, StaticClient};
use checkrun::dashboard::DashboardExecutionTree;
use checkrun::types::{ControlStatus, ResultRow};
use checkrun::workspace::{ModResources, Workspace};

use crate::fake_engine::FakeControlEngine;
use crate::recording_workspace::RecordingWorkspace;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(dashboard: &str) -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                dashboard: DashboardConfig {
                    name: dashboard.to_string(),
                    title: None,
                    children: Vec::new(),
                },
                control: BTreeMap::new(),
                benchmark: BTreeMap::new(),
                card: BTreeMap::new(),
                chart: BTreeMap::new(),
            },
        }
    }

    pub fn with_child(mut self, qualified_name: &str) -> Self {
        self.config.dashboard.children.push(qualified_name.to_string());
        self
    }

    pub fn with_control(mut self, name: &str, control: ControlConfig) -> Self {
        self.config.control.insert(name.to_string(), control);
        self
    }

    pub fn with_benchmark(mut self, name: &str, children: &[&str]) -> Self {
        self.config.benchmark.insert(
            name.to_string(),
            BenchmarkConfig {
                children: children.iter().map(|c| c.to_string()).collect(),
                ..BenchmarkConfig::default()
            },
        );
        self
    }

    pub fn with_card(mut self, name: &str) -> Self {
        self.config.card.insert(name.to_string(), PanelConfig::default());
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.config.config.max_parallel = max_parallel;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `ControlConfig`.
pub struct ControlConfigBuilder {
    control: ControlConfig,
}

impl ControlConfigBuilder {
    pub fn new() -> Self {
        Self {
            control: ControlConfig::default(),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.control.title = Some(title.to_string());
        self
    }

    pub fn row(mut self, resource: &str, status: ControlStatus) -> Self {
        self.control.rows.push(ResultRow {
            resource: resource.to_string(),
            status,
            reason: String::new(),
        });
        self
    }

    pub fn error(mut self, message: &str) -> Self {
        self.control.error = Some(message.to_string());
        self
    }

    pub fn build(self) -> ControlConfig {
        self.control
    }
}

impl Default for ControlConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An execution tree wired to a recording workspace and a fake engine.
pub struct TreeFixture {
    pub tree: Arc<DashboardExecutionTree>,
    pub workspace: Arc<RecordingWorkspace>,
    pub engine: Arc<FakeControlEngine>,
}

impl TreeFixture {
    pub fn new(engine: FakeControlEngine) -> Self {
        Self::with_resources(engine, ModResources::new())
    }

    pub fn with_resources(engine: FakeControlEngine, resources: ModResources) -> Self {
        let workspace = Arc::new(RecordingWorkspace::new(resources));
        let engine = Arc::new(engine);

        let workspace_dyn: Arc<dyn Workspace> = workspace.clone();
        let engine_dyn: Arc<dyn ControlEngine> = engine.clone();
        let client: Arc<dyn QueryClient> = Arc::new(StaticClient::new());

        let tree = DashboardExecutionTree::new(
            "test_dashboard",
            "session-1",
            workspace_dyn,
            client,
            engine_dyn,
        );

        Self {
            tree,
            workspace,
            engine,
        }
    }
}
