//! LLM ranking of replacement selectors.

use serde::Deserialize;
use serde_json::json;
use uitest_core_types::{extract_json_object, ElementInfo, LlmBackend, LlmPrompt};

use crate::types::{ClassifiedSelector, HealRequest, SelectorCandidate};

const RANKING_SYSTEM: &str = "You repair broken selectors in Playwright tests. Given the broken \
selector and the interactive elements of the live page, propose up to three replacement \
selectors that target the element the test meant. Prefer test attributes, then ids, then \
role with accessible name, then visible text. Reply with JSON only: \
{\"candidates\":[{\"element_index\":0,\"selector\":\"...\",\"confidence\":0,\"reasoning\":\"...\"}]} \
where confidence is 0 to 100.";

/// Elements listed in the prompt.
const PROMPT_ELEMENT_LIMIT: usize = 80;

#[derive(Debug, Deserialize)]
struct RankingReply {
    #[serde(default)]
    candidates: Vec<RankedEntry>,
}

#[derive(Debug, Deserialize)]
struct RankedEntry {
    element_index: Option<usize>,
    #[serde(default)]
    selector: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "reason")]
    reasoning: Option<String>,
}

pub(crate) fn build_prompt(
    request: &HealRequest,
    classified: &ClassifiedSelector,
    elements: &[ElementInfo],
) -> LlmPrompt {
    let listed: Vec<_> = elements
        .iter()
        .take(PROMPT_ELEMENT_LIMIT)
        .map(|element| {
            json!({
                "index": element.index,
                "tag": element.tag,
                "text": element.visible_text(),
                "id": element.id,
                "classes": element.classes,
                "test_attribute": element.test_attribute,
                "test_id": element.test_id,
                "role": element.effective_role(),
                "name": element.name,
            })
        })
        .collect();

    let mut user = format!(
        "Broken selector: {}\nSelector kind: {}\nIntended value: {}\nPage: {}\n",
        classified.raw,
        classified.kind.as_str(),
        classified.intent,
        request.target_url
    );
    if let Some(context) = request.context_snippet.as_deref() {
        user.push_str(&format!("Test code around the selector:\n{context}\n"));
    }
    user.push_str("Elements:\n");
    for entry in listed {
        user.push_str(&entry.to_string());
        user.push('\n');
    }
    LlmPrompt::new(RANKING_SYSTEM, user)
}

/// Candidates from a model reply. Entries pointing at unknown elements are
/// dropped; a missing selector is filled with the element's stable selector.
pub(crate) fn parse_reply(raw: &str, elements: &[ElementInfo]) -> Result<Vec<SelectorCandidate>, String> {
    let json = extract_json_object(raw).ok_or_else(|| "reply carries no JSON object".to_string())?;
    let reply: RankingReply = serde_json::from_str(&json).map_err(|err| err.to_string())?;

    let candidates: Vec<SelectorCandidate> = reply
        .candidates
        .into_iter()
        .filter_map(|entry| {
            let element = elements
                .iter()
                .find(|element| Some(element.index) == entry.element_index)?;
            let selector = entry
                .selector
                .map(|selector| selector.trim().to_string())
                .filter(|selector| !selector.is_empty())
                .or_else(|| element.stable_selector())?;
            let confidence = entry.confidence.unwrap_or(0.0);
            let confidence = if confidence > 0.0 && confidence <= 1.0 {
                confidence * 100.0
            } else {
                confidence
            };
            Some(SelectorCandidate {
                selector,
                confidence: confidence.round().clamp(0.0, 100.0) as u8,
                reasoning: entry.reasoning.unwrap_or_else(|| "ranked by model".to_string()),
                element_info: element.clone(),
            })
        })
        .collect();

    if candidates.is_empty() {
        return Err("reply named no usable candidate".to_string());
    }
    Ok(candidates)
}

pub(crate) async fn rank(
    llm: &dyn LlmBackend,
    request: &HealRequest,
    classified: &ClassifiedSelector,
    elements: &[ElementInfo],
) -> Result<Vec<SelectorCandidate>, String> {
    let prompt = build_prompt(request, classified, elements);
    let reply = llm.complete(&prompt).await.map_err(|err| err.to_string())?;
    parse_reply(&reply, elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements() -> Vec<ElementInfo> {
        vec![
            ElementInfo::new(0, "button").with_text("Cancel"),
            ElementInfo::new(1, "button").with_test_id("submit-button"),
        ]
    }

    #[test]
    fn parses_wrapped_reply() {
        let raw = "Sure:\n```json\n{\"candidates\":[{\"element_index\":1,\"selector\":\"[data-testid=\\\"submit-button\\\"]\",\"confidence\":0.92,\"reason\":\"same intent\"}]}\n```";
        let candidates = parse_reply(raw, &elements()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].confidence, 92);
        assert_eq!(candidates[0].reasoning, "same intent");
    }

    #[test]
    fn unknown_elements_are_dropped() {
        let raw = r##"{"candidates":[{"element_index":7,"selector":"#x","confidence":99}]}"##;
        assert!(parse_reply(raw, &elements()).is_err());
    }

    #[test]
    fn missing_selector_uses_stable_selector() {
        let raw = r#"{"candidates":[{"element_index":0,"confidence":75}]}"#;
        let candidates = parse_reply(raw, &elements()).unwrap();
        assert_eq!(candidates[0].selector, "role=button[name=\"Cancel\"]");
    }
}
