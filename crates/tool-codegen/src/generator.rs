use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uitest_core_types::{
    Artifact, ArtifactRole, GeneratedArtifacts, PatternAnswer, ScenarioSet, StructuralSnapshot, Tool,
    ToolFailure, ToolResult,
};

use crate::errors::CodegenError;
use crate::naming::{camel_case, slug};
use crate::templates::{self, SpecContext};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodegenRequest {
    pub feature_name: String,
    pub target_url: Option<String>,
    pub scenarios: ScenarioSet,
    #[serde(default)]
    pub snapshot: Option<StructuralSnapshot>,
    #[serde(default)]
    pub patterns: Option<PatternAnswer>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Locators emitted when scenarios reference no element.
    pub max_locators: usize,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self { max_locators: 25 }
    }
}

/// Renders the page object, test data and test spec for one feature.
#[derive(Clone, Debug, Default)]
pub struct CodeGenerator {
    cfg: CodegenConfig,
}

impl CodeGenerator {
    pub fn new(cfg: CodegenConfig) -> Self {
        Self { cfg }
    }

    pub fn render(&self, request: &CodegenRequest) -> Result<GeneratedArtifacts, CodegenError> {
        if request.scenarios.is_empty() {
            return Err(CodegenError::NoScenarios);
        }
        let feature_slug = slug(&request.feature_name);
        if feature_slug.is_empty() {
            return Err(CodegenError::InvalidName {
                kind: "feature",
                value: request.feature_name.clone(),
            });
        }

        let class_name = templates::class_name(&feature_slug);
        let data_const = format!("{}Data", camel_case(&feature_slug));
        let target_url = request.target_url.as_deref();
        let snapshot = request.snapshot.as_ref();
        let locators = templates::collect_locators(snapshot, &request.scenarios, self.cfg.max_locators);

        let page_object = templates::page_object(&class_name, target_url, &locators);
        let test_data = templates::test_data(&data_const, target_url, snapshot, &locators, &request.scenarios);

        let ctx = SpecContext {
            feature_name: &request.feature_name,
            class_name: &class_name,
            page_module: &format!("../pages/{class_name}"),
            data_const: &data_const,
            data_module: &format!("../data/{feature_slug}.data"),
            locators: &locators,
            snapshot_title: snapshot.and_then(|snapshot| snapshot.title.as_deref()),
        };
        let mut test_spec = String::new();
        if let Some(patterns) = request.patterns.as_ref().filter(|patterns| !patterns.is_empty()) {
            let paths: Vec<&str> = patterns.sources.iter().map(|source| source.path.as_str()).collect();
            test_spec.push_str(&format!("// Patterns consulted: {}\n", paths.join(", ")));
        }
        if request.scenarios.from_fallback {
            test_spec.push_str("// Scenarios derived from page structure.\n");
        }
        test_spec.push_str(&templates::test_spec(&ctx, &request.scenarios));

        let artifacts = GeneratedArtifacts {
            feature_name: feature_slug.clone(),
            page_object: Artifact {
                role: ArtifactRole::PageObject,
                relative_path: format!("pages/{class_name}.ts"),
                contents: page_object,
            },
            test_data: Artifact {
                role: ArtifactRole::TestData,
                relative_path: format!("data/{feature_slug}.data.ts"),
                contents: test_data,
            },
            test_spec: Artifact {
                role: ArtifactRole::TestSpec,
                relative_path: format!("tests/{feature_slug}.spec.ts"),
                contents: test_spec,
            },
        };
        info!(
            target: "tool-codegen",
            feature = %feature_slug,
            locators = locators.len(),
            scenarios = request.scenarios.len(),
            bytes = artifacts.total_bytes(),
            "artifacts rendered"
        );
        Ok(artifacts)
    }
}

#[async_trait]
impl Tool for CodeGenerator {
    type Input = CodegenRequest;
    type Output = GeneratedArtifacts;

    fn name(&self) -> &'static str {
        "code_generator"
    }

    async fn call(&self, input: CodegenRequest) -> ToolResult<GeneratedArtifacts> {
        self.render(&input).map_err(ToolFailure::from)
    }
}
