use tool_codegen::{ArtifactWriter, CodeGenerator, CodegenRequest, FsArtifactWriter};
use uitest_core_types::{
    ElementInfo, Scenario, ScenarioCategory, ScenarioPriority, ScenarioSet, StructuralSnapshot, Tool,
    ToolFailureKind,
};

fn scenario(id: &str, category: ScenarioCategory, priority: ScenarioPriority, refs: Vec<usize>) -> Scenario {
    Scenario {
        id: id.into(),
        title: format!("title of {id}"),
        category,
        priority,
        steps: vec!["do the thing".into()],
        expected: "it works".into(),
        element_refs: refs,
    }
}

fn request() -> CodegenRequest {
    CodegenRequest {
        feature_name: "Login Flow".into(),
        target_url: Some("https://app.test/login".into()),
        scenarios: ScenarioSet::new(vec![
            scenario("smoke-01", ScenarioCategory::Smoke, ScenarioPriority::Critical, vec![]),
            scenario("functional-01", ScenarioCategory::Functional, ScenarioPriority::High, vec![0, 1]),
            scenario("validation-01", ScenarioCategory::Validation, ScenarioPriority::High, vec![0, 1]),
        ]),
        snapshot: Some(StructuralSnapshot {
            url: "https://app.test/login".into(),
            title: Some("Login".into()),
            elements: vec![
                ElementInfo::new(0, "input").with_id("email").with_input_type("email").with_name("Email"),
                ElementInfo::new(1, "button").with_test_id("login-submit").with_text("Sign in"),
            ],
            ..Default::default()
        }),
        patterns: None,
    }
}

#[tokio::test]
async fn renders_three_correlated_files() {
    let artifacts = CodeGenerator::default().call(request()).await.unwrap();

    assert_eq!(artifacts.feature_name, "login-flow");
    assert_eq!(artifacts.page_object.relative_path, "pages/LoginFlowPage.ts");
    assert_eq!(artifacts.test_data.relative_path, "data/login-flow.data.ts");
    assert_eq!(artifacts.test_spec.relative_path, "tests/login-flow.spec.ts");

    let page = &artifacts.page_object.contents;
    assert!(page.contains("export class LoginFlowPage"));
    assert!(page.contains("this.emailInput = page.locator('#email');"));
    assert!(page.contains("this.signInButton = page.locator('[data-testid=\"login-submit\"]');"));

    let data = &artifacts.test_data.contents;
    assert!(data.contains("export const loginFlowData"));
    assert!(data.contains("emailInput: 'qa.user@example.com'"));
    assert!(data.contains("emailInput: 'not-an-email'"));

    let spec = &artifacts.test_spec.contents;
    assert!(spec.contains("import { LoginFlowPage } from '../pages/LoginFlowPage';"));
    assert!(spec.contains("import { loginFlowData } from '../data/login-flow.data';"));
    assert!(spec.contains("test('@p0 smoke-01 title of smoke-01'"));
    assert!(spec.contains("await loginFlowPage.fillEmailInput(loginFlowData.invalid.emailInput);"));
    assert!(spec.contains("await loginFlowPage.clickSignInButton();"));
    assert!(spec.contains("toHaveTitle('Login')"));
}

#[tokio::test]
async fn empty_scenarios_are_a_precondition_failure() {
    let mut req = request();
    req.scenarios = ScenarioSet::default();
    let failure = CodeGenerator::default().call(req).await.unwrap_err();
    assert_eq!(failure.kind, ToolFailureKind::Precondition);
}

#[tokio::test]
async fn writer_lays_out_team_and_feature_directories() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = CodeGenerator::default().render(&request()).unwrap();
    let writer = FsArtifactWriter::new(dir.path());

    let paths = writer.persist("Web Platform", &artifacts).await.unwrap();
    assert_eq!(paths.len(), 3);
    assert_eq!(paths[0], dir.path().join("web-platform/login-flow/pages/LoginFlowPage.ts"));
    for path in &paths {
        assert!(path.exists());
    }
    let spec = std::fs::read_to_string(&paths[2]).unwrap();
    assert_eq!(spec, artifacts.test_spec.contents);

    assert!(writer.persist("///", &artifacts).await.is_err());
}
