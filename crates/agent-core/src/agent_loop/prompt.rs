//! Prompt templates and reply parsing for LLM decisions.

use serde::Deserialize;
use serde_json::Value;
use uitest_core_types::{extract_json_object, LlmPrompt};

use super::types::{Action, ActionKind, ActionSource};
use crate::errors::AgentError;
use crate::model::GenerationTask;
use crate::state::AgentState;

const AGENT_SYSTEM_PROMPT: &str = r#"You are the planner of an agent that authors browser UI test suites.
Each turn you choose exactly one next action from:

- inspect: load the target page and capture its interactive elements (needs a target URL)
- retrieve: look up existing tests, page objects and fixtures; input may carry {"question": "..."}
- generate-scenarios: propose test scenarios for the feature
- generate-code: render page object, test data and test spec (needs scenarios)
- persist: write the generated files (needs generated code)
- done: finish (only after files are persisted)

A phase whose output is already present must not be repeated. Inspect and
retrieve are optional; skip them when they failed before.

Reply with a single JSON object and nothing else:
{"action": "<one of the actions>", "reasoning": "<one sentence>", "tool": "<optional tool name>", "input": {}}"#;

pub fn format_system_prompt() -> &'static str {
    AGENT_SYSTEM_PROMPT
}

/// Task plus a compact view of which state fields are populated.
pub fn format_user_message(task: &GenerationTask, state: &AgentState) -> String {
    let mut message = format!(
        "## Task\n{}\nFeature: {}\nTeam: {}\n",
        task.description, task.feature_name, task.team
    );
    match &task.target_url {
        Some(url) => message.push_str(&format!("Target URL: {url}\n")),
        None => message.push_str("Target URL: none (inspect is unavailable)\n"),
    }

    message.push_str(&format!("\n## State (step {})\n", state.step_count));
    let populated = state.populated_fields();
    if populated.is_empty() {
        message.push_str("Populated: nothing yet\n");
    } else {
        message.push_str(&format!("Populated: {}\n", populated.join(", ")));
    }

    if let Some(snapshot) = &state.structural_snapshot {
        message.push_str(&format!("Page: {}\n", snapshot.summary()));
    }
    if let Some(scenarios) = &state.scenarios {
        message.push_str(&format!("Scenarios: {}\n", scenarios.len()));
    }

    if !state.failures.is_empty() {
        message.push_str("\n## Failures\n");
        for failure in &state.failures {
            message.push_str(&format!(
                "- step {} {}: {} ({})\n",
                failure.step, failure.action, failure.message, failure.kind
            ));
        }
    }

    message.push_str("\nWhat is the next action?");
    message
}

pub(crate) fn build_prompt(task: &GenerationTask, state: &AgentState) -> LlmPrompt {
    LlmPrompt::new(format_system_prompt(), format_user_message(task, state))
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(alias = "kind", alias = "next_action")]
    action: String,
    #[serde(default, alias = "reason", alias = "thinking")]
    reasoning: Option<String>,
    #[serde(default, alias = "tool_name")]
    tool: Option<String>,
    #[serde(default, alias = "tool_input", alias = "params")]
    input: Option<Value>,
}

/// Parse `{action, reasoning, tool?, input?}` out of a model reply.
pub fn parse_decision(raw: &str) -> Result<Action, AgentError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| AgentError::Parse("reply carries no JSON object".to_string()))?;
    let decision: RawDecision =
        serde_json::from_str(&json).map_err(|err| AgentError::Parse(err.to_string()))?;

    let kind: ActionKind = decision
        .action
        .parse()
        .map_err(AgentError::UnknownAction)?;

    let tool_name = decision
        .tool
        .filter(|tool| !tool.trim().is_empty())
        .or_else(|| kind.tool_name().map(str::to_string));

    Ok(Action {
        kind,
        reasoning: decision
            .reasoning
            .unwrap_or_else(|| format!("llm chose {kind}")),
        tool_name,
        tool_input: decision.input.filter(|input| !input.is_null()),
        source: ActionSource::Llm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FailureRecord;
    use uitest_core_types::ToolFailureKind;

    #[test]
    fn parses_fenced_decision() {
        let raw = "Sure.\n```json\n{\"action\": \"retrieve\", \"reasoning\": \"need fixtures\", \"input\": {\"question\": \"login fixtures\"}}\n```";
        let action = parse_decision(raw).unwrap();
        assert_eq!(action.kind, ActionKind::Retrieve);
        assert_eq!(action.source, ActionSource::Llm);
        assert_eq!(action.tool_name.as_deref(), Some("pattern_repository"));
        assert_eq!(action.question_override(), Some("login fixtures"));
    }

    #[test]
    fn rejects_prose_and_unknown_actions() {
        assert!(matches!(parse_decision("I would inspect the page."), Err(AgentError::Parse(_))));
        assert!(matches!(
            parse_decision(r#"{"action": "click", "reasoning": "x"}"#),
            Err(AgentError::UnknownAction(name)) if name == "click"
        ));
        assert!(matches!(parse_decision(r#"{"reasoning": "x"}"#), Err(AgentError::Parse(_))));
    }

    #[test]
    fn default_reasoning_names_action() {
        let action = parse_decision(r#"{"action": "generate_code"}"#).unwrap();
        assert_eq!(action.kind, ActionKind::GenerateCode);
        assert_eq!(action.reasoning, "llm chose generate-code");
    }

    #[test]
    fn user_message_reports_state() {
        let task = GenerationTask::new("cover checkout", "checkout", "payments");
        let mut state = AgentState {
            step_count: 3,
            ..Default::default()
        };
        state.failures.push(FailureRecord {
            step: 1,
            action: ActionKind::Retrieve,
            kind: ToolFailureKind::EmptyResult,
            message: "no matching patterns".into(),
        });
        let message = format_user_message(&task, &state);
        assert!(message.contains("Target URL: none"));
        assert!(message.contains("step 3"));
        assert!(message.contains("Populated: nothing yet"));
        assert!(message.contains("step 1 retrieve: no matching patterns (empty-result)"));
    }
}
