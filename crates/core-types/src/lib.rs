//! Shared primitives for the uitestgen workspace.
//!
//! Every tool crate and the agent core agree on the types defined here:
//! the [`Tool`] contract and its structured failure, the structural page
//! snapshot, retrieved patterns, scenarios, generated artifacts and the
//! LLM backend port.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod artifacts;
pub mod llm;
pub mod pattern;
pub mod scenario;
pub mod snapshot;
pub mod tool;

pub use artifacts::{Artifact, ArtifactRole, GeneratedArtifacts};
pub use llm::{extract_json_object, LlmBackend, LlmError, LlmPrompt, ScriptedLlm};
pub use pattern::{PatternAnswer, PatternSource};
pub use scenario::{Scenario, ScenarioCategory, ScenarioPriority, ScenarioSet};
pub use snapshot::{
    AccessibilityFlags, ElementInfo, PageFacts, StructuralSnapshot, StructureFlags, TEST_ATTRIBUTES,
};
pub use tool::{Tool, ToolFailure, ToolFailureKind, ToolResult};

/// Identifier of one generation task.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
