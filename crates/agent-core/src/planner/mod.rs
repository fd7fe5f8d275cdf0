//! Decision policies: what the orchestrator does next.

mod llm;
mod rule_based;

use async_trait::async_trait;

use crate::agent_loop::Action;
use crate::model::GenerationTask;
use crate::state::AgentState;

pub use llm::{validate, LlmPolicy};
pub use rule_based::{rule_table, RuleBasedPolicy};

/// `decide(task, state) -> Action`.
///
/// Implementations never fail: a policy that cannot reach a decision of its
/// own answers from the rule table.
#[async_trait]
pub trait DecisionPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn decide(&self, task: &GenerationTask, state: &AgentState) -> Action;
}
