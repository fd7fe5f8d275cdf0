use async_trait::async_trait;

use crate::agent_loop::{Action, ActionKind};
use crate::model::GenerationTask;
use crate::planner::DecisionPolicy;
use crate::state::AgentState;

/// Deterministic rule table.
///
/// Inspect and retrieve are optional: once either has failed it counts as
/// settled so the next phase runs instead of a retry with identical input.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedPolicy;

impl RuleBasedPolicy {
    pub fn new() -> Self {
        Self
    }
}

/// Next action by the rule table.
pub fn rule_table(task: &GenerationTask, state: &AgentState) -> Action {
    if task.target_url.is_some() && state.structural_snapshot.is_none() && !state.has_failed(ActionKind::Inspect) {
        return Action::from_rules(ActionKind::Inspect, "target URL known and page not inspected yet");
    }
    if state.retrieved_patterns.is_none() && !state.has_failed(ActionKind::Retrieve) {
        return Action::from_rules(ActionKind::Retrieve, "no reusable patterns retrieved yet");
    }
    if state.scenarios.is_none() {
        let reasoning = match state.failure_count(ActionKind::GenerateScenarios) {
            0 => "no scenarios yet".to_string(),
            n => format!("no scenarios yet after {n} failed attempt(s)"),
        };
        return Action::from_rules(ActionKind::GenerateScenarios, reasoning);
    }
    if state.generated_artifacts.is_none() {
        return Action::from_rules(ActionKind::GenerateCode, "scenarios ready, code not rendered");
    }
    if state.persisted_paths.is_empty() {
        return Action::from_rules(ActionKind::Persist, "artifacts rendered, not written");
    }
    Action::from_rules(ActionKind::Done, "artifacts persisted")
}

#[async_trait]
impl DecisionPolicy for RuleBasedPolicy {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn decide(&self, task: &GenerationTask, state: &AgentState) -> Action {
        rule_table(task, state)
    }
}
