//! Agent state and its pure reducer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uitest_core_types::{
    GeneratedArtifacts, PatternAnswer, ScenarioSet, StructuralSnapshot, ToolFailureKind,
};

use crate::agent_loop::{ActionKind, Observation};

/// A tool failure recorded against the step that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub step: u32,
    pub action: ActionKind,
    pub kind: ToolFailureKind,
    pub message: String,
}

/// Accumulated knowledge for one task.
///
/// The optional fields are set at most once and never cleared; `failures`
/// and `persisted_paths` only grow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    pub step_count: u32,
    pub structural_snapshot: Option<StructuralSnapshot>,
    pub retrieved_patterns: Option<PatternAnswer>,
    pub scenarios: Option<ScenarioSet>,
    pub generated_artifacts: Option<GeneratedArtifacts>,
    pub persisted_paths: Vec<PathBuf>,
    pub completed: bool,
    pub failures: Vec<FailureRecord>,
}

impl AgentState {
    /// State for the next iteration.
    pub fn next_step(mut self) -> Self {
        self.step_count += 1;
        self
    }

    pub fn has_failed(&self, action: ActionKind) -> bool {
        self.failures.iter().any(|failure| failure.action == action)
    }

    pub fn failure_count(&self, action: ActionKind) -> usize {
        self.failures.iter().filter(|failure| failure.action == action).count()
    }

    /// Whether the output of `action` is already present.
    pub fn is_populated(&self, action: ActionKind) -> bool {
        match action {
            ActionKind::Inspect => self.structural_snapshot.is_some(),
            ActionKind::Retrieve => self.retrieved_patterns.is_some(),
            ActionKind::GenerateScenarios => self.scenarios.is_some(),
            ActionKind::GenerateCode => self.generated_artifacts.is_some(),
            ActionKind::Persist => !self.persisted_paths.is_empty(),
            ActionKind::Done => self.completed,
        }
    }

    /// Names of populated fields, for prompts and logs.
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.structural_snapshot.is_some() {
            fields.push("structural_snapshot");
        }
        if self.retrieved_patterns.is_some() {
            fields.push("retrieved_patterns");
        }
        if self.scenarios.is_some() {
            fields.push("scenarios");
        }
        if self.generated_artifacts.is_some() {
            fields.push("generated_artifacts");
        }
        if !self.persisted_paths.is_empty() {
            fields.push("persisted_paths");
        }
        fields
    }
}

/// Partial state carried by an observation.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    pub structural_snapshot: Option<StructuralSnapshot>,
    pub retrieved_patterns: Option<PatternAnswer>,
    pub scenarios: Option<ScenarioSet>,
    pub generated_artifacts: Option<GeneratedArtifacts>,
    pub persisted_paths: Vec<PathBuf>,
    pub completed: bool,
    pub failure: Option<FailureRecord>,
}

impl StateDelta {
    pub fn failure(record: FailureRecord) -> Self {
        Self {
            failure: Some(record),
            ..Default::default()
        }
    }
}

/// Merge an observation into the state.
///
/// A delta for a set-once field that is already present is dropped.
pub fn reduce(mut state: AgentState, observation: Observation) -> AgentState {
    let delta = observation.state_delta;

    set_once(&mut state.structural_snapshot, delta.structural_snapshot, "structural_snapshot");
    set_once(&mut state.retrieved_patterns, delta.retrieved_patterns, "retrieved_patterns");
    set_once(&mut state.scenarios, delta.scenarios, "scenarios");
    set_once(&mut state.generated_artifacts, delta.generated_artifacts, "generated_artifacts");

    state.persisted_paths.extend(delta.persisted_paths);
    state.failures.extend(delta.failure);
    state.completed |= delta.completed || observation.task_complete;
    state
}

fn set_once<T>(slot: &mut Option<T>, incoming: Option<T>, field: &'static str) {
    let Some(value) = incoming else {
        return;
    };
    if slot.is_some() {
        warn!(target: "agent-core", field, "ignoring second write to set-once field");
        return;
    }
    *slot = Some(value);
}
