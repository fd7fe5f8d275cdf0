use serde::{Deserialize, Serialize};
use uitest_core_types::{PatternAnswer, StructuralSnapshot};

/// Input slice handed to the generator by the orchestrator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScenarioRequest {
    /// Free-form description of what the suite should cover.
    pub task: String,
    pub feature_name: String,
    #[serde(default)]
    pub snapshot: Option<StructuralSnapshot>,
    #[serde(default)]
    pub patterns: Option<PatternAnswer>,
}

impl ScenarioRequest {
    pub fn new(task: impl Into<String>, feature_name: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            feature_name: feature_name.into(),
            ..Default::default()
        }
    }

    pub fn with_snapshot(mut self, snapshot: StructuralSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_patterns(mut self, patterns: PatternAnswer) -> Self {
        self.patterns = Some(patterns);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub max_scenarios: usize,
    /// Skip the LLM entirely and use the deterministic generator.
    pub deterministic_only: bool,
    /// Elements listed in the prompt.
    pub prompt_element_limit: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            max_scenarios: 12,
            deterministic_only: false,
            prompt_element_limit: 40,
        }
    }
}

impl ScenarioConfig {
    pub fn with_max_scenarios(mut self, max_scenarios: usize) -> Self {
        self.max_scenarios = max_scenarios.max(1);
        self
    }

    pub fn deterministic(mut self) -> Self {
        self.deterministic_only = true;
        self
    }
}
