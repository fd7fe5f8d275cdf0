//! Actions, observations and step records exchanged inside the loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::StateDelta;

/// The six things the agent can do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Inspect,
    Retrieve,
    GenerateScenarios,
    GenerateCode,
    Persist,
    Done,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Inspect,
        ActionKind::Retrieve,
        ActionKind::GenerateScenarios,
        ActionKind::GenerateCode,
        ActionKind::Persist,
        ActionKind::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Inspect => "inspect",
            ActionKind::Retrieve => "retrieve",
            ActionKind::GenerateScenarios => "generate-scenarios",
            ActionKind::GenerateCode => "generate-code",
            ActionKind::Persist => "persist",
            ActionKind::Done => "done",
        }
    }

    /// Tool that serves the action; `done` runs no tool.
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            ActionKind::Inspect => Some("page_inspector"),
            ActionKind::Retrieve => Some("pattern_repository"),
            ActionKind::GenerateScenarios => Some("scenario_generator"),
            ActionKind::GenerateCode => Some("code_generator"),
            ActionKind::Persist => Some("artifact_writer"),
            ActionKind::Done => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .or_else(|| {
                ActionKind::ALL
                    .into_iter()
                    .find(|kind| kind.tool_name() == Some(raw.trim()))
            })
            .ok_or_else(|| raw.to_string())
    }
}

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    Llm,
    Rules,
}

impl ActionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionSource::Llm => "llm",
            ActionSource::Rules => "rules",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,
    pub source: ActionSource,
}

impl Action {
    pub fn from_rules(kind: ActionKind, reasoning: impl Into<String>) -> Self {
        Self {
            kind,
            reasoning: reasoning.into(),
            tool_name: kind.tool_name().map(str::to_string),
            tool_input: None,
            source: ActionSource::Rules,
        }
    }

    /// `input.question` supplied with a retrieve decision.
    pub fn question_override(&self) -> Option<&str> {
        self.tool_input
            .as_ref()?
            .get("question")?
            .as_str()
            .map(str::trim)
            .filter(|question| !question.is_empty())
    }
}

/// Result of executing one action.
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub summary: String,
    pub state_delta: StateDelta,
    pub task_complete: bool,
}

impl Observation {
    pub fn new(summary: impl Into<String>, state_delta: StateDelta) -> Self {
        Self {
            summary: summary.into(),
            state_delta,
            task_complete: false,
        }
    }

    pub fn completing(mut self) -> Self {
        self.task_complete = true;
        self
    }
}

/// One loop iteration as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: u32,
    pub action: ActionKind,
    pub source: ActionSource,
    pub summary: String,
    pub failed: bool,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_kind_spellings() {
        assert_eq!("generate_code".parse::<ActionKind>(), Ok(ActionKind::GenerateCode));
        assert_eq!("Generate Scenarios".parse::<ActionKind>(), Ok(ActionKind::GenerateScenarios));
        assert_eq!("page_inspector".parse::<ActionKind>(), Ok(ActionKind::Inspect));
        assert!("navigate".parse::<ActionKind>().is_err());
    }

    #[test]
    fn question_override_requires_text() {
        let mut action = Action::from_rules(ActionKind::Retrieve, "r");
        assert_eq!(action.question_override(), None);
        action.tool_input = Some(json!({"question": "  login fixtures "}));
        assert_eq!(action.question_override(), Some("login fixtures"));
        action.tool_input = Some(json!({"question": ""}));
        assert_eq!(action.question_override(), None);
    }
}
