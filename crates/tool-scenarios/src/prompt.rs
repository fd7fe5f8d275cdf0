//! Prompt construction and lenient parsing of the model's reply.

use serde::Deserialize;
use tracing::debug;
use uitest_core_types::{
    extract_json_object, LlmPrompt, Scenario, ScenarioCategory, ScenarioPriority,
};

use crate::errors::ScenarioParseError;
use crate::model::{ScenarioConfig, ScenarioRequest};

const SYSTEM: &str = r#"You are a senior QA engineer designing browser UI test scenarios.
Reply with a single JSON object and nothing else:
{"scenarios":[{"title":"...","category":"smoke|functional|validation|navigation|accessibility|edge-case","priority":"critical|high|medium|low","steps":["..."],"expected":"...","element_refs":[0]}]}
element_refs are indices from the element list. Cover the critical path first."#;

pub(crate) fn build_prompt(request: &ScenarioRequest, cfg: &ScenarioConfig) -> LlmPrompt {
    let mut user = format!(
        "Task: {}\nFeature: {}\nPropose at most {} scenarios.\n",
        request.task, request.feature_name, cfg.max_scenarios
    );

    match &request.snapshot {
        Some(snapshot) => {
            user.push_str(&format!("\nPage: {}\nElements:\n", snapshot.summary()));
            for element in snapshot.elements.iter().take(cfg.prompt_element_limit) {
                user.push_str(&format!(
                    "  [{}] <{}> role={} label={:?} id={:?} test_id={:?}\n",
                    element.index,
                    element.tag,
                    element.effective_role().unwrap_or("-"),
                    element.label().unwrap_or(""),
                    element.id.as_deref().unwrap_or(""),
                    element.test_id.as_deref().unwrap_or(""),
                ));
            }
        }
        None => user.push_str("\nNo page snapshot is available; derive scenarios from the task.\n"),
    }

    if let Some(patterns) = &request.patterns {
        user.push_str(&format!("\nExisting patterns:\n{}\n", patterns.answer));
    }

    LlmPrompt::new(SYSTEM, user)
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    scenarios: Vec<RawScenario>,
}

#[derive(Debug, Deserialize)]
struct RawScenario {
    #[serde(default, alias = "name")]
    title: Option<String>,
    #[serde(default, alias = "type")]
    category: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    steps: Vec<String>,
    #[serde(default, alias = "expected_result")]
    expected: Option<String>,
    #[serde(default)]
    element_refs: Vec<usize>,
}

/// Parse the reply; entries without a title are dropped, unknown labels
/// fall back to `functional` / `medium`.
pub(crate) fn parse_reply(raw: &str, element_count: usize) -> Result<Vec<Scenario>, ScenarioParseError> {
    let json = extract_json_object(raw).ok_or(ScenarioParseError::NoJson)?;
    let reply: RawReply = serde_json::from_str(&json)?;

    let scenarios: Vec<Scenario> = reply
        .scenarios
        .into_iter()
        .filter_map(|raw| {
            let title = raw.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let category = raw
                .category
                .as_deref()
                .and_then(|label| label.parse::<ScenarioCategory>().ok())
                .unwrap_or_else(|| {
                    debug!(target: "tool-scenarios", label = ?raw.category, "unknown category");
                    ScenarioCategory::Functional
                });
            let priority = raw
                .priority
                .as_deref()
                .and_then(|label| label.parse::<ScenarioPriority>().ok())
                .unwrap_or(ScenarioPriority::Medium);
            Some(Scenario {
                id: String::new(),
                title,
                category,
                priority,
                steps: raw
                    .steps
                    .into_iter()
                    .map(|step| step.trim().to_string())
                    .filter(|step| !step.is_empty())
                    .collect(),
                expected: raw.expected.unwrap_or_default().trim().to_string(),
                element_refs: raw
                    .element_refs
                    .into_iter()
                    .filter(|index| *index < element_count)
                    .collect(),
            })
        })
        .collect();

    if scenarios.is_empty() {
        return Err(ScenarioParseError::NoScenarios);
    }
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_reply_with_loose_labels() {
        let raw = r#"Sure!
```json
{"scenarios":[
  {"title":"User logs in","category":"happy-path","priority":"P0","steps":["open","submit"],"expected":"dashboard","element_refs":[1,99]},
  {"title":"  ","category":"smoke"},
  {"name":"Keyboard only","type":"a11y","priority":"whenever"}
]}
```"#;
        let scenarios = parse_reply(raw, 3).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].category, ScenarioCategory::Functional);
        assert_eq!(scenarios[0].priority, ScenarioPriority::Critical);
        assert_eq!(scenarios[0].element_refs, vec![1]);
        assert_eq!(scenarios[1].category, ScenarioCategory::Accessibility);
        assert_eq!(scenarios[1].priority, ScenarioPriority::Medium);
    }

    #[test]
    fn rejects_prose_and_empty_lists() {
        assert!(matches!(parse_reply("I cannot help", 0), Err(ScenarioParseError::NoJson)));
        assert!(matches!(
            parse_reply(r#"{"scenarios": []}"#, 0),
            Err(ScenarioParseError::NoScenarios)
        ));
        assert!(matches!(
            parse_reply(r#"{"scenarios": "nope"}"#, 0),
            Err(ScenarioParseError::Malformed(_))
        ));
    }
}
