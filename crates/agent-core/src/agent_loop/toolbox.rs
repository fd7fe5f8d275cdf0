//! The typed set of tools the loop dispatches to.

use std::sync::Arc;

use pattern_repo::PatternQuery;
use perceiver_structural::InspectRequest;
use tool_codegen::{ArtifactWriter, CodegenRequest};
use tool_scenarios::ScenarioRequest;
use uitest_core_types::{GeneratedArtifacts, PatternAnswer, ScenarioSet, StructuralSnapshot, Tool};

pub type InspectTool = Arc<dyn Tool<Input = InspectRequest, Output = StructuralSnapshot>>;
pub type PatternTool = Arc<dyn Tool<Input = PatternQuery, Output = PatternAnswer>>;
pub type ScenarioTool = Arc<dyn Tool<Input = ScenarioRequest, Output = ScenarioSet>>;
pub type CodegenTool = Arc<dyn Tool<Input = CodegenRequest, Output = GeneratedArtifacts>>;

/// One field per action kind that runs a tool.
#[derive(Clone)]
pub struct Toolbox {
    pub inspector: InspectTool,
    pub patterns: PatternTool,
    pub scenarios: ScenarioTool,
    pub codegen: CodegenTool,
    pub writer: Arc<dyn ArtifactWriter>,
}

impl Toolbox {
    pub fn new(
        inspector: InspectTool,
        patterns: PatternTool,
        scenarios: ScenarioTool,
        codegen: CodegenTool,
        writer: Arc<dyn ArtifactWriter>,
    ) -> Self {
        Self {
            inspector,
            patterns,
            scenarios,
            codegen,
            writer,
        }
    }

    /// Tool names in action order, for logs.
    pub fn names(&self) -> [&'static str; 4] {
        [
            self.inspector.name(),
            self.patterns.name(),
            self.scenarios.name(),
            self.codegen.name(),
        ]
    }
}
