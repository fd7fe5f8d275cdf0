//! Deterministic candidate scoring.
//!
//! Each element is scored against the intent of the broken selector and keeps
//! its best rule:
//!
//! | rule                               | confidence |
//! |------------------------------------|-----------:|
//! | test attribute equals intent       | 95         |
//! | test attribute shares a token      | 90         |
//! | id equals or shares a token        | 80         |
//! | visible text contains intent       | 70         |
//! | accessible name matches            | 65         |
//! | class shares a token               | 60         |

use std::collections::HashSet;

use uitest_core_types::ElementInfo;

use crate::classify::tokens;
use crate::types::{ClassifiedSelector, SelectorCandidate, SelectorKind};

const TEST_ID_EXACT: u8 = 95;
const TEST_ID_OVERLAP: u8 = 90;
const ID_MATCH: u8 = 80;
const TEXT_MATCH: u8 = 70;
const NAME_MATCH: u8 = 65;
const CLASS_OVERLAP: u8 = 60;

/// Tokens shorter than this never count as overlap.
const MIN_TOKEN_LEN: usize = 3;

/// Every element with a positive score, best first, DOM order on ties.
pub fn heuristic_candidates(
    classified: &ClassifiedSelector,
    elements: &[ElementInfo],
) -> Vec<SelectorCandidate> {
    let intent = classified.intent.to_lowercase();
    let intent_tokens = significant_tokens(&classified.intent);
    if intent.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(u8, usize, SelectorCandidate)> = elements
        .iter()
        .filter_map(|element| {
            let (confidence, reasoning) = score(classified.kind, &intent, &intent_tokens, element)?;
            let selector = candidate_selector(element, &intent_tokens)?;
            if selector == classified.raw {
                return None;
            }
            Some((
                confidence,
                element.index,
                SelectorCandidate {
                    selector,
                    confidence,
                    reasoning,
                    element_info: element.clone(),
                },
            ))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut seen = HashSet::new();
    scored
        .into_iter()
        .map(|(_, _, candidate)| candidate)
        .filter(|candidate| seen.insert(candidate.selector.clone()))
        .collect()
}

fn score(
    kind: SelectorKind,
    intent: &str,
    intent_tokens: &HashSet<String>,
    element: &ElementInfo,
) -> Option<(u8, String)> {
    let mut best: Option<(u8, String)> = None;
    let mut offer = |confidence: u8, reasoning: String| {
        if best.as_ref().map_or(true, |(current, _)| confidence > *current) {
            best = Some((confidence, reasoning));
        }
    };

    if let Some(test_id) = element.test_id.as_deref() {
        let attr = element.test_attribute.as_deref().unwrap_or("test attribute");
        if test_id.eq_ignore_ascii_case(intent) {
            offer(TEST_ID_EXACT, format!("{attr}=\"{test_id}\" equals the intended value"));
        } else if overlaps(intent_tokens, test_id) {
            offer(TEST_ID_OVERLAP, format!("{attr}=\"{test_id}\" shares a word with '{intent}'"));
        }
    }

    if let Some(id) = element.id.as_deref().filter(|id| !id.is_empty()) {
        if id.eq_ignore_ascii_case(intent) || overlaps(intent_tokens, id) {
            offer(ID_MATCH, format!("id '{id}' matches '{intent}'"));
        }
    }

    if let Some(text) = element.visible_text() {
        let lowered = text.to_lowercase();
        let matched = match kind {
            SelectorKind::TextMatch => lowered.contains(intent) || intent.contains(lowered.as_str()),
            _ => overlaps(intent_tokens, text),
        };
        if matched {
            offer(TEXT_MATCH, format!("visible text '{text}' matches '{intent}'"));
        }
    }

    if let Some(name) = element.name.as_deref().filter(|name| !name.trim().is_empty()) {
        if name.eq_ignore_ascii_case(intent) || overlaps(intent_tokens, name) {
            let role = element.effective_role().unwrap_or(element.tag.as_str());
            offer(NAME_MATCH, format!("{role} named '{name}' matches '{intent}'"));
        }
    }

    if let Some(class) = element
        .classes
        .iter()
        .find(|class| class.eq_ignore_ascii_case(intent) || overlaps(intent_tokens, class))
    {
        offer(CLASS_OVERLAP, format!("class '{class}' shares a word with '{intent}'"));
    }

    best
}

/// Stable selector for the element, else the class that matched.
fn candidate_selector(element: &ElementInfo, intent_tokens: &HashSet<String>) -> Option<String> {
    if let Some(selector) = element.stable_selector() {
        return Some(selector);
    }
    element
        .classes
        .iter()
        .find(|class| overlaps(intent_tokens, class))
        .map(|class| format!("{}.{class}", element.tag))
}

fn significant_tokens(value: &str) -> HashSet<String> {
    tokens(value)
        .into_iter()
        .filter(|token| token.len() >= MIN_TOKEN_LEN)
        .collect()
}

fn overlaps(intent_tokens: &HashSet<String>, value: &str) -> bool {
    significant_tokens(value)
        .iter()
        .any(|token| intent_tokens.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    fn page() -> Vec<ElementInfo> {
        vec![
            ElementInfo::new(0, "button").with_id("cancel").with_text("Cancel"),
            ElementInfo::new(1, "button").with_test_id("submit-button").with_text("Submit"),
            ElementInfo::new(2, "button").with_text("Submit later").with_classes(["btn", "submit-secondary"]),
        ]
    }

    #[test]
    fn test_attribute_overlap_outranks_text() {
        let classified = classify("#old-submit").unwrap();
        let candidates = heuristic_candidates(&classified, &page());
        assert_eq!(candidates[0].selector, "[data-testid=\"submit-button\"]");
        assert_eq!(candidates[0].confidence, TEST_ID_OVERLAP);
        assert_eq!(candidates[1].confidence, TEXT_MATCH);
        assert!(candidates.iter().all(|c| c.element_info.index != 0));
    }

    #[test]
    fn exact_test_attribute_scores_highest() {
        let classified = classify("[data-cy=\"submit-button\"]").unwrap();
        let candidates = heuristic_candidates(&classified, &page());
        assert_eq!(candidates[0].confidence, TEST_ID_EXACT);
    }

    #[test]
    fn ties_follow_dom_order() {
        let elements = vec![
            ElementInfo::new(0, "a").with_href("/a").with_text("Checkout now"),
            ElementInfo::new(1, "a").with_href("/b").with_text("Checkout"),
        ];
        let classified = classify("text=Checkout").unwrap();
        let candidates = heuristic_candidates(&classified, &elements);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].element_info.index, 0);
        assert_eq!(candidates[0].confidence, candidates[1].confidence);
    }

    #[test]
    fn class_only_elements_get_class_selector() {
        let elements = vec![ElementInfo::new(0, "div").with_classes(["menu-toggle"])];
        let classified = classify(".old-toggle").unwrap();
        let candidates = heuristic_candidates(&classified, &elements);
        assert_eq!(candidates[0].selector, "div.menu-toggle");
        assert_eq!(candidates[0].confidence, CLASS_OVERLAP);
    }
}
