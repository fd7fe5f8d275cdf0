use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_locator::{HealConfig, HealRequest, HealStatus, LocatorError, SelectorHealer};
use cdp_adapter::fixture::{FixtureDriver, FixturePage};
use uitest_core_types::{ElementInfo, ScriptedLlm, Tool, ToolFailureKind};

const URL: &str = "https://app.test/checkout";
const SPEC: &str = "test('submit', async ({ page }) => {\n  await page.locator(\"#old-submit\").click();\n  await expect(page.locator(\"#old-submit\")).toBeHidden();\n});\n";

fn driver() -> FixtureDriver {
    FixtureDriver::new().with_page(
        URL,
        FixturePage::new("Checkout")
            .with_element(ElementInfo::new(0, "button").with_id("cancel").with_text("Cancel"))
            .with_element(ElementInfo::new(0, "button").with_test_id("submit-button").with_text("Submit order")),
    )
}

fn spec_file(dir: &Path) -> PathBuf {
    let path = dir.join("checkout.spec.ts");
    std::fs::write(&path, SPEC).unwrap();
    path
}

fn backups(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "bak"))
        .collect()
}

#[tokio::test]
async fn heuristic_heal_patches_source_and_keeps_backup() {
    let dir = tempfile::tempdir().unwrap();
    let file = spec_file(dir.path());
    let healer = SelectorHealer::new(Arc::new(driver()));

    let result = healer.heal(&HealRequest::new(URL, "#old-submit", &file)).await.unwrap();

    assert_eq!(result.status, HealStatus::Healed);
    assert_eq!(result.new_selector.as_deref(), Some("[data-testid='submit-button']"));
    assert!(result.confidence >= 80);
    assert_eq!(result.replacements, 2);

    let patched = std::fs::read_to_string(&file).unwrap();
    assert!(patched.contains("page.locator(\"[data-testid='submit-button']\")"));
    assert!(!patched.contains("#old-submit"));

    let backup = result.backup_path.unwrap();
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), SPEC);
    assert_eq!(backups(dir.path()), vec![backup]);
}

#[tokio::test]
async fn second_run_is_nothing_to_fix() {
    let dir = tempfile::tempdir().unwrap();
    let file = spec_file(dir.path());
    let healer = SelectorHealer::new(Arc::new(driver()));
    let request = HealRequest::new(URL, "#old-submit", &file);

    assert!(healer.heal(&request).await.unwrap().is_healed());
    let again = healer.heal(&request).await.unwrap();

    assert_eq!(again.status, HealStatus::NothingToFix);
    assert_eq!(backups(dir.path()).len(), 1);
}

#[tokio::test]
async fn resolving_selector_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("cancel.spec.ts");
    std::fs::write(&file, "await page.locator('#cancel').click();\n").unwrap();
    let fixture = driver();
    let healer = SelectorHealer::new(Arc::new(fixture.clone()));

    let result = healer.heal(&HealRequest::new(URL, "#cancel", &file)).await.unwrap();

    assert_eq!(result.status, HealStatus::NothingToFix);
    assert!(backups(dir.path()).is_empty());
    assert_eq!(fixture.opened_count(), fixture.closed_count());
}

#[tokio::test]
async fn missing_source_is_a_precondition_failure() {
    let dir = tempfile::tempdir().unwrap();
    let healer = SelectorHealer::new(Arc::new(driver()));
    let request = HealRequest::new(URL, "#old-submit", dir.path().join("absent.spec.ts"));

    let err = healer.heal(&request).await.unwrap_err();
    assert!(matches!(err, LocatorError::SourceMissing(_)));

    let failure = healer.call(request).await.unwrap_err();
    assert_eq!(failure.kind, ToolFailureKind::Precondition);
}

fn ranked_reply() -> String {
    r##"{"candidates":[
        {"element_index":1,"selector":"#submit-order","confidence":97,"reasoning":"guessed id"},
        {"element_index":1,"selector":"[data-testid=\"submit-button\"]","confidence":91,"reasoning":"test id names submit"}
    ]}"##
        .to_string()
}

#[tokio::test]
async fn unverified_top_candidate_is_rejected_without_cascade() {
    let dir = tempfile::tempdir().unwrap();
    let file = spec_file(dir.path());
    let llm = Arc::new(ScriptedLlm::with_replies([ranked_reply()]));
    let healer = SelectorHealer::new(Arc::new(driver())).with_llm(llm.clone());

    let result = healer.heal(&HealRequest::new(URL, "#old-submit", &file)).await.unwrap();

    assert_eq!(llm.call_count(), 1);
    assert_eq!(result.status, HealStatus::NoVerifiedReplacement);
    assert_eq!(result.rejected, vec!["#submit-order".to_string()]);
    assert!(result.reasoning.contains("no verified replacement found"));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), SPEC);
    assert!(backups(dir.path()).is_empty());
}

#[tokio::test]
async fn cascade_tries_the_next_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let file = spec_file(dir.path());
    let llm = Arc::new(ScriptedLlm::with_replies([ranked_reply()]));
    let healer = SelectorHealer::new(Arc::new(driver()))
        .with_llm(llm)
        .with_config(HealConfig::default().with_cascade(true));

    let result = healer.heal(&HealRequest::new(URL, "#old-submit", &file)).await.unwrap();

    assert_eq!(result.status, HealStatus::Healed);
    assert_eq!(result.confidence, 91);
    assert_eq!(result.reasoning, "test id names submit");
    assert_eq!(result.rejected, vec!["#submit-order".to_string()]);
}

#[tokio::test]
async fn unusable_llm_reply_falls_back_to_heuristic() {
    let dir = tempfile::tempdir().unwrap();
    let file = spec_file(dir.path());
    let llm = Arc::new(ScriptedLlm::with_replies(["I cannot help with that."]));
    let healer = SelectorHealer::new(Arc::new(driver())).with_llm(llm);

    let result = healer
        .heal(&HealRequest::new(URL, "#old-submit", &file).with_context("await page.locator(\"#old-submit\")"))
        .await
        .unwrap();

    assert!(result.is_healed());
    assert_eq!(result.confidence, 90);
}

#[tokio::test]
async fn low_confidence_candidates_are_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let file = spec_file(dir.path());
    let healer = SelectorHealer::new(Arc::new(driver()))
        .with_config(HealConfig::default().with_min_confidence(95));

    let result = healer.heal(&HealRequest::new(URL, "#old-submit", &file)).await.unwrap();

    assert_eq!(result.status, HealStatus::NoVerifiedReplacement);
    assert!(result.candidates.is_empty());
    assert_eq!(std::fs::read_to_string(&file).unwrap(), SPEC);
}

#[tokio::test]
async fn prefix_selector_heals_once_and_leaves_longer_literals_alone() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("order.spec.ts");
    let original = "await page.locator('#submit').click();\nawait page.locator('#submit-later').click();\n";
    std::fs::write(&file, original).unwrap();
    let fixture = FixtureDriver::new().with_page(
        URL,
        FixturePage::new("Checkout").with_element(ElementInfo::new(0, "button").with_id("submit-order")),
    );
    let healer = SelectorHealer::new(Arc::new(fixture));
    let request = HealRequest::new(URL, "#submit", &file);

    let first = healer.heal(&request).await.unwrap();
    assert_eq!(first.status, HealStatus::Healed);
    assert_eq!(first.new_selector.as_deref(), Some("#submit-order"));
    assert_eq!(first.replacements, 1);
    let patched = "await page.locator('#submit-order').click();\nawait page.locator('#submit-later').click();\n";
    assert_eq!(std::fs::read_to_string(&file).unwrap(), patched);

    let again = healer.heal(&request).await.unwrap();
    assert_eq!(again.status, HealStatus::NothingToFix);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), patched);

    let kept = backups(dir.path());
    assert_eq!(kept.len(), 1);
    assert_eq!(std::fs::read_to_string(&kept[0]).unwrap(), original);
}
