// src/control/result.rs

//! Result artifact produced by the control engine.
//!
//! A [`ControlExecutionTree`] mirrors the benchmark hierarchy: groups nest
//! groups and hold [`ControlRun`]s. Control runs are filled in while the
//! engine executes, so their state sits behind a mutex; group summaries are
//! computed on demand.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Serialize, Serializer};

use crate::types::{ControlStatus, ResultRow, RunStatus};
use crate::workspace::ControlDefinition;

use super::client::QueryClient;

/// Row counts per [`ControlStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub ok: usize,
    pub alarm: usize,
    pub info: usize,
    pub skip: usize,
    pub error: usize,
}

impl StatusSummary {
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.add(row.status);
        }
        summary
    }

    pub fn add(&mut self, status: ControlStatus) {
        match status {
            ControlStatus::Ok => self.ok += 1,
            ControlStatus::Alarm => self.alarm += 1,
            ControlStatus::Info => self.info += 1,
            ControlStatus::Skip => self.skip += 1,
            ControlStatus::Error => self.error += 1,
        }
    }

    pub fn merge(&mut self, other: &StatusSummary) {
        self.ok += other.ok;
        self.alarm += other.alarm;
        self.info += other.info;
        self.skip += other.skip;
        self.error += other.error;
    }

    pub fn total(&self) -> usize {
        self.ok + self.alarm + self.info + self.skip + self.error
    }
}

/// Mutable part of a [`ControlRun`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlRunState {
    pub run_status: RunStatus,
    pub rows: Vec<ResultRow>,
    pub summary: StatusSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Evaluation of one control.
#[derive(Debug)]
pub struct ControlRun {
    definition: Arc<ControlDefinition>,
    state: Mutex<ControlRunState>,
}

impl ControlRun {
    pub fn new(definition: Arc<ControlDefinition>) -> Self {
        Self {
            definition,
            state: Mutex::new(ControlRunState {
                run_status: RunStatus::Ready,
                rows: Vec::new(),
                summary: StatusSummary::default(),
                error: None,
            }),
        }
    }

    pub fn control_id(&self) -> &str {
        &self.definition.name
    }

    pub fn title(&self) -> Option<&str> {
        self.definition.title.as_deref()
    }

    pub fn definition(&self) -> &Arc<ControlDefinition> {
        &self.definition
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ControlRunState {
        self.lock_state().clone()
    }

    pub fn run_status(&self) -> RunStatus {
        self.lock_state().run_status
    }

    /// Record query rows and mark the control complete. Returns the row
    /// summary.
    pub fn set_rows(&self, rows: Vec<ResultRow>) -> StatusSummary {
        let summary = StatusSummary::from_rows(&rows);
        let mut state = self.lock_state();
        state.rows = rows;
        state.summary = summary;
        state.run_status = RunStatus::Complete;
        summary
    }

    pub fn set_error(&self, error: impl Into<String>) {
        let mut state = self.lock_state();
        state.error = Some(error.into());
        state.run_status = RunStatus::Error;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ControlRunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Serialize for ControlRun {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            control_id: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            title: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            #[serde(flatten)]
            state: ControlRunState,
        }

        View {
            control_id: self.control_id(),
            title: self.title(),
            description: self.definition.description.as_deref(),
            state: self.state(),
        }
        .serialize(serializer)
    }
}

/// A benchmark (or the single-control root) in the result hierarchy.
#[derive(Debug)]
pub struct ResultGroup {
    group_id: String,
    title: Option<String>,
    description: Option<String>,
    groups: Vec<ResultGroup>,
    control_runs: Vec<Arc<ControlRun>>,
}

impl ResultGroup {
    pub fn new(
        group_id: impl Into<String>,
        title: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            title,
            description,
            groups: Vec::new(),
            control_runs: Vec::new(),
        }
    }

    pub fn add_group(&mut self, group: ResultGroup) {
        self.groups.push(group);
    }

    pub fn add_control_run(&mut self, run: Arc<ControlRun>) {
        self.control_runs.push(run);
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn groups(&self) -> &[ResultGroup] {
        &self.groups
    }

    pub fn control_runs(&self) -> &[Arc<ControlRun>] {
        &self.control_runs
    }

    /// Every control run in this group and its descendants, depth first.
    pub fn all_control_runs(&self) -> Vec<Arc<ControlRun>> {
        let mut runs = self.control_runs.clone();
        for group in &self.groups {
            runs.extend(group.all_control_runs());
        }
        runs
    }

    pub fn summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for run in &self.control_runs {
            summary.merge(&run.state().summary);
        }
        for group in &self.groups {
            summary.merge(&group.summary());
        }
        summary
    }
}

impl Serialize for ResultGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            group_id: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            title: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
            summary: StatusSummary,
            groups: &'a [ResultGroup],
            controls: Vec<&'a ControlRun>,
        }

        View {
            group_id: &self.group_id,
            title: self.title.as_deref(),
            description: self.description.as_deref(),
            summary: self.summary(),
            groups: &self.groups,
            controls: self.control_runs.iter().map(|run| run.as_ref()).collect(),
        }
        .serialize(serializer)
    }
}

/// Result artifact of one leaf run.
#[derive(Serialize)]
pub struct ControlExecutionTree {
    root: ResultGroup,
    #[serde(skip)]
    client: Arc<dyn QueryClient>,
}

impl ControlExecutionTree {
    pub fn new(root: ResultGroup, client: Arc<dyn QueryClient>) -> Self {
        Self { root, client }
    }

    pub fn root(&self) -> &ResultGroup {
        &self.root
    }

    pub fn client(&self) -> &Arc<dyn QueryClient> {
        &self.client
    }

    pub fn control_runs(&self) -> Vec<Arc<ControlRun>> {
        self.root.all_control_runs()
    }

    pub fn summary(&self) -> StatusSummary {
        self.root.summary()
    }
}

impl fmt::Debug for ControlExecutionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlExecutionTree")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
