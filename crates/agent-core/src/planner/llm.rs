use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uitest_core_types::LlmBackend;

use super::rule_based::rule_table;
use super::DecisionPolicy;
use crate::agent_loop::prompt::{build_prompt, parse_decision};
use crate::agent_loop::{Action, ActionKind};
use crate::errors::AgentError;
use crate::metrics;
use crate::model::GenerationTask;
use crate::state::AgentState;

/// LLM-first policy, validated against the state and backed by the rule table.
pub struct LlmPolicy {
    llm: Arc<dyn LlmBackend>,
}

impl LlmPolicy {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }

    async fn consult(&self, task: &GenerationTask, state: &AgentState) -> Result<Action, AgentError> {
        let prompt = build_prompt(task, state);
        let reply = self.llm.complete(&prompt).await?;
        let action = parse_decision(&reply)?;
        validate(&action, task, state)?;
        Ok(action)
    }
}

/// Reject actions whose prerequisites do not hold or that would
/// overwrite a set-once field.
pub fn validate(action: &Action, task: &GenerationTask, state: &AgentState) -> Result<(), AgentError> {
    let kind = action.kind;
    if kind != ActionKind::Done && state.is_populated(kind) {
        return Err(AgentError::inadmissible(kind, "output already present"));
    }
    match kind {
        ActionKind::Inspect if task.target_url.is_none() => {
            Err(AgentError::inadmissible(kind, "no target URL"))
        }
        ActionKind::GenerateCode if state.scenarios.is_none() => {
            Err(AgentError::inadmissible(kind, "no scenarios yet"))
        }
        ActionKind::Persist if state.generated_artifacts.is_none() => {
            Err(AgentError::inadmissible(kind, "no generated artifacts"))
        }
        ActionKind::Done if state.persisted_paths.is_empty() => {
            Err(AgentError::inadmissible(kind, "nothing persisted"))
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl DecisionPolicy for LlmPolicy {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn decide(&self, task: &GenerationTask, state: &AgentState) -> Action {
        match self.consult(task, state).await {
            Ok(action) => {
                metrics::record_llm_decision();
                debug!(
                    target: "agent-core",
                    step = state.step_count,
                    action = %action.kind,
                    backend = self.llm.name(),
                    "llm decision accepted"
                );
                action
            }
            Err(err) => {
                metrics::record_llm_fallback();
                let action = rule_table(task, state);
                warn!(
                    target: "agent-core",
                    step = state.step_count,
                    error = %err,
                    fallback = %action.kind,
                    "llm decision rejected; using rule table"
                );
                action
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_loop::ActionSource;
    use uitest_core_types::{ScenarioSet, ScriptedLlm};

    fn task() -> GenerationTask {
        GenerationTask::new("cover search", "search", "web")
    }

    #[test]
    fn validation_enforces_prerequisites() {
        let task = task();
        let state = AgentState::default();
        let action = |kind| Action::from_rules(kind, "test");

        assert!(validate(&action(ActionKind::Inspect), &task, &state).is_err());
        assert!(validate(&action(ActionKind::GenerateCode), &task, &state).is_err());
        assert!(validate(&action(ActionKind::Persist), &task, &state).is_err());
        assert!(validate(&action(ActionKind::Done), &task, &state).is_err());
        assert!(validate(&action(ActionKind::Retrieve), &task, &state).is_ok());
        assert!(validate(&action(ActionKind::GenerateScenarios), &task, &state).is_ok());
    }

    #[test]
    fn validation_rejects_repeated_phase() {
        let state = AgentState {
            scenarios: Some(ScenarioSet::default()),
            ..Default::default()
        };
        let err = validate(&Action::from_rules(ActionKind::GenerateScenarios, "again"), &task(), &state)
            .unwrap_err();
        assert!(err.to_string().contains("already present"));
        assert!(validate(&Action::from_rules(ActionKind::GenerateCode, "next"), &task(), &state).is_ok());
    }

    #[tokio::test]
    async fn accepts_admissible_reply() {
        let llm = Arc::new(ScriptedLlm::with_replies([
            r#"{"action": "generate-scenarios", "reasoning": "nothing to inspect"}"#,
        ]));
        let policy = LlmPolicy::new(llm.clone());
        let action = policy.decide(&task(), &AgentState::default()).await;
        assert_eq!(action.kind, ActionKind::GenerateScenarios);
        assert_eq!(action.source, ActionSource::Llm);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn falls_back_on_garbage_and_inadmissible_replies() {
        let llm = Arc::new(ScriptedLlm::with_replies([
            "let me think about it",
            r#"{"action": "done", "reasoning": "looks finished"}"#,
        ]));
        let policy = LlmPolicy::new(llm);
        let state = AgentState::default();

        let first = policy.decide(&task(), &state).await;
        assert_eq!(first.kind, ActionKind::Retrieve);
        assert_eq!(first.source, ActionSource::Rules);

        let second = policy.decide(&task(), &state).await;
        assert_eq!(second.kind, ActionKind::Retrieve);
        assert_eq!(second.source, ActionSource::Rules);

        let exhausted = policy.decide(&task(), &state).await;
        assert_eq!(exhausted.source, ActionSource::Rules);
    }
}
