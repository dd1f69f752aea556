// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::ResultRow;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// max_parallel = 4
///
/// [dashboard]
/// name = "storage_compliance"
/// children = ["benchmark.s3", "control.ebs_encrypted"]
///
/// [control.ebs_encrypted]
/// title = "EBS volumes are encrypted"
/// rows = [{ resource = "vol-1", status = "ok" }]
///
/// [benchmark.s3]
/// children = ["control.s3_versioning"]
/// ```
///
/// This is the unvalidated form; use `ConfigFile::try_from` (or
/// [`crate::config::load_and_validate`]) to obtain a checked [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    pub dashboard: DashboardConfig,

    /// `[control.<name>]` sections, keyed by short name.
    #[serde(default)]
    pub control: BTreeMap<String, ControlConfig>,

    /// `[benchmark.<name>]` sections, keyed by short name.
    #[serde(default)]
    pub benchmark: BTreeMap<String, BenchmarkConfig>,

    #[serde(default)]
    pub card: BTreeMap<String, PanelConfig>,

    #[serde(default)]
    pub chart: BTreeMap<String, PanelConfig>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub dashboard: DashboardConfig,
    pub control: BTreeMap<String, ControlConfig>,
    pub benchmark: BTreeMap<String, BenchmarkConfig>,
    pub card: BTreeMap<String, PanelConfig>,
    pub chart: BTreeMap<String, PanelConfig>,
}

impl ConfigFile {
    /// Build a `ConfigFile` without validation. Only [`crate::config::validate`]
    /// calls this after the raw config passed its checks.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            dashboard: raw.dashboard,
            control: raw.control,
            benchmark: raw.benchmark,
            card: raw.card,
            chart: raw.chart,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of control queries evaluated concurrently per leaf run.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_max_parallel() -> usize {
    10
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
        }
    }
}

/// `[dashboard]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Qualified names of the panels shown on the dashboard, e.g.
    /// `control.ebs_encrypted`. They are not required to resolve: a missing
    /// control surfaces as an error on its run.
    #[serde(default)]
    pub children: Vec<String>,
}

/// `[control.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlConfig {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    /// Query text. Only displayed; rows come from `rows`.
    #[serde(default)]
    pub query: Option<String>,

    /// Rows the static client returns for this control.
    #[serde(default)]
    pub rows: Vec<ResultRow>,

    /// If set, the query fails with this message.
    #[serde(default)]
    pub error: Option<String>,
}

/// `[benchmark.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    /// Qualified names of nested controls and benchmarks.
    #[serde(default)]
    pub children: Vec<String>,
}

/// `[card.<name>]` / `[chart.<name>]` sections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,
}
