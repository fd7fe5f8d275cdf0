use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use agent_core::{
    ActionKind, ActionSource, AgentLoopConfig, GenerationTask, Orchestrator, OrchestratorError, Toolbox,
};
use async_trait::async_trait;
use cdp_adapter::fixture::{FixtureDriver, FixturePage};
use cdp_adapter::AdapterErrorKind;
use pattern_repo::{PatternConfig, PatternEntry, PatternIndex, PatternQuery, PatternRepository};
use perceiver_structural::PageInspector;
use tool_codegen::{ArtifactWriter, CodeGenerator, CodegenError, FsArtifactWriter};
use tool_scenarios::{ScenarioConfig, ScenarioGenerator, ScenarioRequest};
use uitest_core_types::{
    ElementInfo, GeneratedArtifacts, PatternAnswer, ScenarioSet, ScriptedLlm, Tool, ToolFailure,
    ToolResult,
};

const LOGIN_URL: &str = "https://app.test/login";

fn login_page() -> FixturePage {
    FixturePage::new("Login").with_elements([
        ElementInfo::new(0, "input").with_id("email").with_input_type("email").with_name("Email"),
        ElementInfo::new(0, "input").with_id("password").with_input_type("password").with_name("Password"),
        ElementInfo::new(0, "button").with_test_id("login-submit").with_text("Sign in"),
    ])
}

fn index() -> PatternIndex {
    PatternIndex::from_entries([PatternEntry {
        path: "auth/login.spec.ts".into(),
        content: "await loginPage.fillCredentials(user);\nawait loginPage.submit();".into(),
        tags: vec!["auth".into(), "login".into()],
    }])
}

fn task() -> GenerationTask {
    GenerationTask::new("cover the login form", "login", "web").with_target_url(LOGIN_URL)
}

struct Harness {
    driver: FixtureDriver,
    out: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            driver: FixtureDriver::new().with_page(LOGIN_URL, login_page()),
            out: tempfile::tempdir().unwrap(),
        }
    }

    fn toolbox(&self) -> Toolbox {
        Toolbox::new(
            Arc::new(PageInspector::new(Arc::new(self.driver.clone()))),
            Arc::new(
                PatternRepository::new(index()).with_config(PatternConfig::default().with_summarize(false)),
            ),
            Arc::new(
                ScenarioGenerator::builder()
                    .with_config(ScenarioConfig::default().deterministic())
                    .build(),
            ),
            Arc::new(CodeGenerator::default()),
            Arc::new(FsArtifactWriter::new(self.out.path())),
        )
    }
}

/// Scenario tool that never produces output.
struct FailingScenarios {
    calls: AtomicUsize,
}

#[async_trait]
impl Tool for FailingScenarios {
    type Input = ScenarioRequest;
    type Output = ScenarioSet;

    fn name(&self) -> &'static str {
        "scenario_generator"
    }

    async fn call(&self, _input: ScenarioRequest) -> ToolResult<ScenarioSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ToolFailure::network("llm endpoint unreachable"))
    }
}

struct EmptyPatterns;

#[async_trait]
impl Tool for EmptyPatterns {
    type Input = PatternQuery;
    type Output = PatternAnswer;

    fn name(&self) -> &'static str {
        "pattern_repository"
    }

    async fn call(&self, input: PatternQuery) -> ToolResult<PatternAnswer> {
        Err(ToolFailure::empty(format!("no patterns for '{}'", input.question)))
    }
}

struct BrokenWriter;

#[async_trait]
impl ArtifactWriter for BrokenWriter {
    async fn persist(&self, _team: &str, artifacts: &GeneratedArtifacts) -> Result<Vec<PathBuf>, CodegenError> {
        Err(CodegenError::Io {
            path: PathBuf::from("/read-only").join(&artifacts.feature_name),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

fn kinds(outcome: &agent_core::RunOutcome) -> Vec<ActionKind> {
    outcome.steps.iter().map(|step| step.action).collect()
}

#[tokio::test]
async fn nominal_run_takes_five_steps() {
    let harness = Harness::new();
    let orchestrator = Orchestrator::builder(harness.toolbox())
        .with_config(AgentLoopConfig::new().max_steps(10))
        .build();

    let outcome = orchestrator.run(&task()).await.unwrap();

    assert_eq!(
        kinds(&outcome),
        vec![
            ActionKind::Inspect,
            ActionKind::Retrieve,
            ActionKind::GenerateScenarios,
            ActionKind::GenerateCode,
            ActionKind::Persist,
        ]
    );
    assert!(outcome.steps.iter().all(|step| !step.failed && step.source == ActionSource::Rules));
    assert_eq!(outcome.state.step_count, 5);

    let snapshot = outcome.state.structural_snapshot.as_ref().unwrap();
    assert_eq!(snapshot.elements.len(), 3);
    assert_eq!(outcome.state.retrieved_patterns.as_ref().unwrap().sources[0].path, "auth/login.spec.ts");

    assert_eq!(outcome.persisted_paths().len(), 3);
    for path in outcome.persisted_paths() {
        assert!(path.starts_with(harness.out.path().join("web").join("login")));
        assert!(path.exists(), "{} missing", path.display());
    }
    let page_object = std::fs::read_to_string(&outcome.persisted_paths()[0]).unwrap();
    assert!(page_object.contains("[data-testid=\"login-submit\"]"));
    assert!(outcome.artifacts().is_some());

    assert_eq!(harness.driver.opened_count(), 1);
    assert_eq!(harness.driver.closed_count(), 1);
}

#[tokio::test]
async fn step_budget_is_exhausted_exactly() {
    let harness = Harness::new();
    let scenarios = Arc::new(FailingScenarios {
        calls: AtomicUsize::new(0),
    });
    let mut toolbox = harness.toolbox();
    toolbox.scenarios = scenarios.clone();

    let orchestrator = Orchestrator::builder(toolbox)
        .with_config(AgentLoopConfig::new().max_steps(6))
        .build();
    let err = orchestrator.run(&task()).await.unwrap_err();

    match err {
        OrchestratorError::MaxStepsExceeded { max_steps, pending } => {
            assert_eq!(max_steps, 6);
            assert_eq!(pending, ActionKind::GenerateScenarios);
        }
        other => panic!("unexpected error: {other}"),
    }
    // inspect + retrieve, then four scenario attempts
    assert_eq!(scenarios.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn failed_optional_phases_are_skipped() {
    let harness = Harness::new();
    harness.driver.fail_with(Some(AdapterErrorKind::NavFailed));
    let mut toolbox = harness.toolbox();
    toolbox.patterns = Arc::new(EmptyPatterns);

    let outcome = Orchestrator::new(toolbox).run(&task()).await.unwrap();

    assert_eq!(
        kinds(&outcome),
        vec![
            ActionKind::Inspect,
            ActionKind::Retrieve,
            ActionKind::GenerateScenarios,
            ActionKind::GenerateCode,
            ActionKind::Persist,
        ]
    );
    let failed: Vec<bool> = outcome.steps.iter().map(|step| step.failed).collect();
    assert_eq!(failed, vec![true, true, false, false, false]);
    assert!(outcome.state.structural_snapshot.is_none());
    assert!(outcome.state.retrieved_patterns.is_none());
    assert_eq!(outcome.state.failures.len(), 2);
    assert_eq!(outcome.persisted_paths().len(), 3);
}

#[tokio::test]
async fn runs_without_target_url() {
    let harness = Harness::new();
    let task = GenerationTask::new("cover the login form", "login", "web");

    let outcome = Orchestrator::new(harness.toolbox()).run(&task).await.unwrap();

    assert_eq!(outcome.steps_taken(), 4);
    assert_eq!(outcome.steps[0].action, ActionKind::Retrieve);
    assert_eq!(harness.driver.opened_count(), 0);
}

#[tokio::test]
async fn every_optional_failure_combination_completes_without_repeats() {
    for with_url in [true, false] {
        for inspect_fails in [true, false] {
            for retrieve_fails in [true, false] {
                let harness = Harness::new();
                if inspect_fails {
                    harness.driver.fail_with(Some(AdapterErrorKind::NavTimeout));
                }
                let mut toolbox = harness.toolbox();
                if retrieve_fails {
                    toolbox.patterns = Arc::new(EmptyPatterns);
                }
                let mut task = GenerationTask::new("cover the login form", "login", "web");
                if with_url {
                    task = task.with_target_url(LOGIN_URL);
                }

                let outcome = Orchestrator::new(toolbox).run(&task).await.unwrap();

                let kinds = kinds(&outcome);
                let mut unique = kinds.clone();
                unique.dedup();
                assert_eq!(unique, kinds, "repeated phase for {with_url}/{inspect_fails}/{retrieve_fails}");
                assert!(kinds.len() <= 5);
                assert_eq!(kinds.last(), Some(&ActionKind::Persist));
            }
        }
    }
}

#[tokio::test]
async fn llm_decisions_are_validated() {
    let harness = Harness::new();
    let llm = Arc::new(ScriptedLlm::with_replies([
        "I think we should start by looking around.",
        r#"{"action": "retrieve", "reasoning": "reuse page objects", "input": {"question": "login page objects"}}"#,
        r#"{"action": "done", "reasoning": "nothing left"}"#,
        r#"{"action": "generate_code", "reasoning": "scenarios are ready"}"#,
    ]));
    let orchestrator = Orchestrator::builder(harness.toolbox())
        .with_llm(llm.clone())
        .build();
    assert_eq!(orchestrator.policy_name(), "llm");

    let outcome = orchestrator.run(&task()).await.unwrap();

    let decided: Vec<(ActionKind, ActionSource)> =
        outcome.steps.iter().map(|step| (step.action, step.source)).collect();
    assert_eq!(
        decided,
        vec![
            (ActionKind::Inspect, ActionSource::Rules),
            (ActionKind::Retrieve, ActionSource::Llm),
            (ActionKind::GenerateScenarios, ActionSource::Rules),
            (ActionKind::GenerateCode, ActionSource::Llm),
            (ActionKind::Persist, ActionSource::Rules),
        ]
    );
    assert_eq!(
        outcome.state.retrieved_patterns.as_ref().unwrap().question,
        "login page objects"
    );
    assert_eq!(llm.call_count(), 5);
    assert!(llm.prompts()[2].user.contains("structural_snapshot, retrieved_patterns"));
}

#[tokio::test]
async fn llm_is_ignored_when_disabled() {
    let harness = Harness::new();
    let llm = Arc::new(ScriptedLlm::offline());
    let orchestrator = Orchestrator::builder(harness.toolbox())
        .with_config(AgentLoopConfig::new().llm_decisions(false))
        .with_llm(llm.clone())
        .build();

    assert_eq!(orchestrator.policy_name(), "rules");
    orchestrator.run(&task()).await.unwrap();
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn persistence_errors_leave_run() {
    let harness = Harness::new();
    let mut toolbox = harness.toolbox();
    toolbox.writer = Arc::new(BrokenWriter);

    let err = Orchestrator::new(toolbox).run(&task()).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Persistence(CodegenError::Io { .. })));
}
