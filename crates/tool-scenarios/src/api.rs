use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uitest_core_types::{
    LlmBackend, Scenario, ScenarioCategory, ScenarioSet, Tool, ToolFailure, ToolResult,
};

use crate::fallback;
use crate::model::{ScenarioConfig, ScenarioRequest};
use crate::prompt::{build_prompt, parse_reply};

pub struct ScenarioGenerator {
    llm: Option<Arc<dyn LlmBackend>>,
    cfg: ScenarioConfig,
}

pub struct ScenarioGeneratorBuilder {
    llm: Option<Arc<dyn LlmBackend>>,
    cfg: ScenarioConfig,
}

impl ScenarioGeneratorBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            cfg: ScenarioConfig::default(),
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmBackend>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_config(mut self, cfg: ScenarioConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn build(self) -> ScenarioGenerator {
        ScenarioGenerator {
            llm: self.llm,
            cfg: self.cfg,
        }
    }
}

impl Default for ScenarioGeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioGenerator {
    pub fn builder() -> ScenarioGeneratorBuilder {
        ScenarioGeneratorBuilder::new()
    }

    pub async fn generate(&self, request: &ScenarioRequest) -> ToolResult<ScenarioSet> {
        if request.task.trim().is_empty() && request.snapshot.is_none() {
            return Err(ToolFailure::invalid_input(
                "scenario generation needs a task description or a page snapshot",
            ));
        }

        let (mut scenarios, from_fallback) = match self.from_llm(request).await {
            Some(scenarios) => (scenarios, false),
            None => (fallback::generate(request), true),
        };
        scenarios.truncate(self.cfg.max_scenarios);
        assign_ids(&mut scenarios);

        if scenarios.is_empty() {
            return Err(ToolFailure::empty("no scenarios could be derived"));
        }
        info!(
            target: "tool-scenarios",
            count = scenarios.len(),
            from_fallback,
            "scenarios generated"
        );
        Ok(ScenarioSet {
            scenarios,
            from_fallback,
        })
    }

    async fn from_llm(&self, request: &ScenarioRequest) -> Option<Vec<Scenario>> {
        if self.cfg.deterministic_only {
            return None;
        }
        let llm = self.llm.as_ref()?;
        let prompt = build_prompt(request, &self.cfg);
        let element_count = request
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.elements.len())
            .unwrap_or(0);

        match llm.complete(&prompt).await {
            Ok(reply) => match parse_reply(&reply, element_count) {
                Ok(scenarios) => Some(scenarios),
                Err(err) => {
                    warn!(target: "tool-scenarios", error = %err, "unusable llm reply; using deterministic scenarios");
                    None
                }
            },
            Err(err) => {
                warn!(target: "tool-scenarios", backend = llm.name(), error = %err, "llm unavailable; using deterministic scenarios");
                None
            }
        }
    }
}

/// `<category>-<nn>` ids, numbered per category in list order.
fn assign_ids(scenarios: &mut [Scenario]) {
    let mut counters: BTreeMap<ScenarioCategory, usize> = BTreeMap::new();
    for scenario in scenarios.iter_mut() {
        let counter = counters.entry(scenario.category).or_insert(0);
        *counter += 1;
        scenario.id = format!("{}-{:02}", scenario.category.as_str(), counter);
    }
}

#[async_trait]
impl Tool for ScenarioGenerator {
    type Input = ScenarioRequest;
    type Output = ScenarioSet;

    fn name(&self) -> &'static str {
        "scenario_generator"
    }

    async fn call(&self, input: ScenarioRequest) -> ToolResult<ScenarioSet> {
        self.generate(&input).await
    }
}
