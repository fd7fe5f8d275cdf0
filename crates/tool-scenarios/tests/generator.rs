use std::sync::Arc;

use tool_scenarios::{ScenarioConfig, ScenarioGenerator, ScenarioRequest};
use uitest_core_types::{
    ElementInfo, ScenarioCategory, ScenarioPriority, ScriptedLlm, StructuralSnapshot, Tool,
    ToolFailureKind,
};

fn snapshot() -> StructuralSnapshot {
    StructuralSnapshot {
        url: "https://app.test/signup".into(),
        title: Some("Sign up".into()),
        elements: vec![
            ElementInfo::new(0, "input").with_input_type("text").with_name("Full name"),
            ElementInfo::new(1, "button").with_text("Create account"),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn llm_scenarios_are_used_and_numbered() {
    let llm = ScriptedLlm::with_replies([r#"{"scenarios":[
        {"title":"Create account","category":"functional","priority":"critical","steps":["fill","submit"],"expected":"welcome","element_refs":[0,1]},
        {"title":"Empty name","category":"validation","priority":"high"},
        {"title":"Second happy path","category":"functional","priority":"low"}
    ]}"#]);
    let generator = ScenarioGenerator::builder().with_llm(Arc::new(llm.clone())).build();

    let set = generator
        .call(ScenarioRequest::new("cover sign up", "signup").with_snapshot(snapshot()))
        .await
        .unwrap();

    assert!(!set.from_fallback);
    let ids: Vec<_> = set.scenarios.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["functional-01", "validation-01", "functional-02"]);
    assert!(llm.prompts()[0].user.contains("Create account"));

    let grouped = set.grouped();
    assert_eq!(grouped[&ScenarioCategory::Functional][0].priority, ScenarioPriority::Critical);
}

#[tokio::test]
async fn malformed_reply_falls_back_to_deterministic_set() {
    let llm = ScriptedLlm::with_replies(["Here are some ideas: test the button."]);
    let generator = ScenarioGenerator::builder().with_llm(Arc::new(llm)).build();

    let set = generator
        .generate(&ScenarioRequest::new("cover sign up", "signup").with_snapshot(snapshot()))
        .await
        .unwrap();
    assert!(set.from_fallback);
    assert_eq!(set.scenarios[0].category, ScenarioCategory::Smoke);
    assert_eq!(set.scenarios[0].id, "smoke-01");
}

#[tokio::test]
async fn offline_generation_respects_limit() {
    let generator = ScenarioGenerator::builder()
        .with_llm(Arc::new(ScriptedLlm::offline()))
        .with_config(ScenarioConfig::default().with_max_scenarios(2))
        .build();

    let set = generator
        .generate(&ScenarioRequest::new("cover sign up", "signup").with_snapshot(snapshot()))
        .await
        .unwrap();
    assert_eq!(set.len(), 2);
}

#[tokio::test]
async fn empty_request_is_invalid_input() {
    let generator = ScenarioGenerator::builder().build();
    let failure = generator
        .call(ScenarioRequest::new("  ", "signup"))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, ToolFailureKind::InvalidInput);
}
