// src/workspace/resource.rs

//! Resource definitions loaded from config.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::types::{split_qualified_name, ResultRow, BLOCK_TYPE_BENCHMARK, BLOCK_TYPE_CONTROL};

/// Read-only description of a dashboard panel that may be hosted by a leaf
/// run.
///
/// The block type is an open set (`control`, `benchmark`, `card`, ...); leaf
/// runs classify it once when they are constructed.
pub trait DashboardLeafNode: Send + Sync + fmt::Debug {
    /// Fully qualified name, e.g. `control.ebs_encrypted`.
    fn name(&self) -> &str;
    fn title(&self) -> Option<&str>;
    fn width(&self) -> Option<u32>;
    fn block_type(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDefinition {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub width: Option<u32>,
    pub query: Option<String>,
    pub rows: Vec<ResultRow>,
    pub error: Option<String>,
}

impl ControlDefinition {
    /// A control with no rows and no configured failure.
    pub fn new(short_name: &str) -> Self {
        Self {
            name: format!("{BLOCK_TYPE_CONTROL}.{short_name}"),
            title: None,
            description: None,
            width: None,
            query: None,
            rows: Vec::new(),
            error: None,
        }
    }
}

impl DashboardLeafNode for ControlDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn width(&self) -> Option<u32> {
        self.width
    }

    fn block_type(&self) -> &str {
        BLOCK_TYPE_CONTROL
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkDefinition {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub width: Option<u32>,
    /// Qualified names of nested controls and benchmarks, in display order.
    pub children: Vec<String>,
}

impl BenchmarkDefinition {
    pub fn new(short_name: &str, children: Vec<String>) -> Self {
        Self {
            name: format!("{BLOCK_TYPE_BENCHMARK}.{short_name}"),
            title: None,
            description: None,
            width: None,
            children,
        }
    }
}

impl DashboardLeafNode for BenchmarkDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn width(&self) -> Option<u32> {
        self.width
    }

    fn block_type(&self) -> &str {
        BLOCK_TYPE_BENCHMARK
    }
}

/// Non-check panels such as cards and charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelDefinition {
    pub name: String,
    pub block_type: String,
    pub title: Option<String>,
    pub width: Option<u32>,
}

impl DashboardLeafNode for PanelDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn width(&self) -> Option<u32> {
        self.width
    }

    fn block_type(&self) -> &str {
        &self.block_type
    }
}

/// A dashboard child that names a resource the workspace does not define.
///
/// The block type comes from the name prefix, so an unresolved control still
/// classifies as a control and fails later, when its evaluation tree is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    name: String,
    block_type: String,
}

impl ResourceRef {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let block_type = split_qualified_name(&name)
            .map(|(block_type, _)| block_type.to_string())
            .unwrap_or_default();
        Self { name, block_type }
    }
}

impl DashboardLeafNode for ResourceRef {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> Option<&str> {
        None
    }

    fn width(&self) -> Option<u32> {
        None
    }

    fn block_type(&self) -> &str {
        &self.block_type
    }
}

/// All resources of a workspace, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct ModResources {
    controls: BTreeMap<String, Arc<ControlDefinition>>,
    benchmarks: BTreeMap<String, Arc<BenchmarkDefinition>>,
    panels: BTreeMap<String, Arc<PanelDefinition>>,
}

impl ModResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut resources = Self::new();

        for (short, control) in &cfg.control {
            resources.add_control(ControlDefinition {
                name: format!("{BLOCK_TYPE_CONTROL}.{short}"),
                title: control.title.clone(),
                description: control.description.clone(),
                width: control.width,
                query: control.query.clone(),
                rows: control.rows.clone(),
                error: control.error.clone(),
            });
        }

        for (short, benchmark) in &cfg.benchmark {
            resources.add_benchmark(BenchmarkDefinition {
                name: format!("{BLOCK_TYPE_BENCHMARK}.{short}"),
                title: benchmark.title.clone(),
                description: benchmark.description.clone(),
                width: benchmark.width,
                children: benchmark.children.clone(),
            });
        }

        for (block_type, panels) in [("card", &cfg.card), ("chart", &cfg.chart)] {
            for (short, panel) in panels {
                resources.add_panel(PanelDefinition {
                    name: format!("{block_type}.{short}"),
                    block_type: block_type.to_string(),
                    title: panel.title.clone(),
                    width: panel.width,
                });
            }
        }

        resources
    }

    pub fn add_control(&mut self, control: ControlDefinition) {
        self.controls.insert(control.name.clone(), Arc::new(control));
    }

    pub fn add_benchmark(&mut self, benchmark: BenchmarkDefinition) {
        self.benchmarks
            .insert(benchmark.name.clone(), Arc::new(benchmark));
    }

    pub fn add_panel(&mut self, panel: PanelDefinition) {
        self.panels.insert(panel.name.clone(), Arc::new(panel));
    }

    pub fn control(&self, name: &str) -> Option<Arc<ControlDefinition>> {
        self.controls.get(name).cloned()
    }

    pub fn benchmark(&self, name: &str) -> Option<Arc<BenchmarkDefinition>> {
        self.benchmarks.get(name).cloned()
    }

    /// Look up any panel by qualified name.
    pub fn leaf_node(&self, name: &str) -> Option<Arc<dyn DashboardLeafNode>> {
        if let Some(control) = self.controls.get(name) {
            return Some(control.clone());
        }
        if let Some(benchmark) = self.benchmarks.get(name) {
            return Some(benchmark.clone());
        }
        self.panels
            .get(name)
            .map(|panel| panel.clone() as Arc<dyn DashboardLeafNode>)
    }

    /// Like [`leaf_node`](Self::leaf_node), falling back to an unresolved
    /// [`ResourceRef`].
    pub fn leaf_node_or_ref(&self, name: &str) -> Arc<dyn DashboardLeafNode> {
        self.leaf_node(name)
            .unwrap_or_else(|| Arc::new(ResourceRef::new(name)))
    }
}
