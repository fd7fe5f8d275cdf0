//! Deterministic scenario generation from the structural snapshot.
//!
//! Always yields at least one smoke scenario, so scenario generation never
//! fails for lack of a snapshot or patterns.

use uitest_core_types::{
    ElementInfo, Scenario, ScenarioCategory, ScenarioPriority, StructuralSnapshot,
};

use crate::model::ScenarioRequest;

const MAX_BUTTON_SCENARIOS: usize = 3;
const MAX_LINK_SCENARIOS: usize = 3;

fn scenario(
    title: impl Into<String>,
    category: ScenarioCategory,
    priority: ScenarioPriority,
    steps: Vec<String>,
    expected: impl Into<String>,
    element_refs: Vec<usize>,
) -> Scenario {
    Scenario {
        id: String::new(),
        title: title.into(),
        category,
        priority,
        steps,
        expected: expected.into(),
        element_refs,
    }
}

fn describe(element: &ElementInfo) -> String {
    element
        .label()
        .map(str::to_string)
        .or_else(|| element.test_id.clone())
        .or_else(|| element.id.clone())
        .unwrap_or_else(|| format!("{} #{}", element.tag, element.index))
}

pub(crate) fn generate(request: &ScenarioRequest) -> Vec<Scenario> {
    let mut out = Vec::new();
    let feature = request.feature_name.trim();
    let feature = if feature.is_empty() { "the page" } else { feature };

    let Some(snapshot) = &request.snapshot else {
        out.push(scenario(
            format!("{feature} loads"),
            ScenarioCategory::Smoke,
            ScenarioPriority::Critical,
            vec![format!("Open {feature}"), "Wait for the page to settle".to_string()],
            "The page renders without errors",
            Vec::new(),
        ));
        out.push(scenario(
            format!("{feature}: {}", request.task.trim()),
            ScenarioCategory::Functional,
            ScenarioPriority::High,
            vec![format!("Open {feature}"), format!("Perform: {}", request.task.trim())],
            "The described behaviour is observable",
            Vec::new(),
        ));
        return out;
    };

    out.push(smoke(snapshot, feature));
    out.extend(form_scenarios(snapshot));
    out.extend(search_scenario(snapshot));
    out.extend(button_scenarios(snapshot));
    out.extend(link_scenarios(snapshot));
    out.push(accessibility(snapshot));
    out.extend(edge_cases(snapshot));

    if let Some(patterns) = &request.patterns {
        if let Some(source) = patterns.sources.first() {
            let hint = format!("Reuse helpers from {}", source.path);
            for item in out
                .iter_mut()
                .filter(|s| s.category == ScenarioCategory::Functional)
            {
                item.steps.insert(0, hint.clone());
            }
        }
    }
    out
}

fn smoke(snapshot: &StructuralSnapshot, feature: &str) -> Scenario {
    let expected = match &snapshot.title {
        Some(title) => format!("Page title is \"{title}\" and the main content is visible"),
        None => "The main content is visible".to_string(),
    };
    scenario(
        format!("{feature} loads successfully"),
        ScenarioCategory::Smoke,
        ScenarioPriority::Critical,
        vec![format!("Navigate to {}", snapshot.url), "Wait for the page to settle".to_string()],
        expected,
        Vec::new(),
    )
}

fn form_scenarios(snapshot: &StructuralSnapshot) -> Vec<Scenario> {
    let inputs: Vec<&ElementInfo> = snapshot
        .inputs()
        .filter(|element| element.input_type.as_deref() != Some("search"))
        .collect();
    if inputs.is_empty() {
        return Vec::new();
    }
    let submit = snapshot.buttons().next();
    let input_refs: Vec<usize> = inputs.iter().map(|element| element.index).collect();
    let mut all_refs = input_refs.clone();
    all_refs.extend(submit.map(|element| element.index));

    let mut fill_steps: Vec<String> = inputs
        .iter()
        .map(|element| format!("Fill \"{}\" with valid data", describe(element)))
        .collect();
    let submit_step = match submit {
        Some(button) => format!("Click \"{}\"", describe(button)),
        None => "Submit the form".to_string(),
    };
    fill_steps.push(submit_step.clone());

    let mut out = vec![
        scenario(
            "Submit the form with valid data",
            ScenarioCategory::Functional,
            ScenarioPriority::High,
            fill_steps,
            "The form is accepted and a success state is shown",
            all_refs.clone(),
        ),
        scenario(
            "Submit the form with required fields empty",
            ScenarioCategory::Validation,
            ScenarioPriority::High,
            vec!["Leave all fields empty".to_string(), submit_step.clone()],
            "Validation messages are shown and the form is not submitted",
            all_refs,
        ),
    ];

    for email in inputs
        .iter()
        .filter(|element| element.input_type.as_deref() == Some("email"))
    {
        out.push(scenario(
            format!("Reject malformed email in \"{}\"", describe(email)),
            ScenarioCategory::Validation,
            ScenarioPriority::Medium,
            vec![
                format!("Fill \"{}\" with \"not-an-email\"", describe(email)),
                submit_step.clone(),
            ],
            "An email format error is shown",
            vec![email.index],
        ));
    }
    out
}

fn search_scenario(snapshot: &StructuralSnapshot) -> Option<Scenario> {
    if !snapshot.structure.has_search {
        return None;
    }
    let field = snapshot.elements.iter().find(|element| {
        element.input_type.as_deref() == Some("search") || element.effective_role() == Some("searchbox")
    });
    Some(scenario(
        "Search returns matching results",
        ScenarioCategory::Functional,
        ScenarioPriority::High,
        vec![
            "Enter a known term in the search field".to_string(),
            "Submit the search".to_string(),
        ],
        "Results matching the term are listed",
        field.map(|element| vec![element.index]).unwrap_or_default(),
    ))
}

fn button_scenarios(snapshot: &StructuralSnapshot) -> Vec<Scenario> {
    let has_form_inputs = snapshot.inputs().next().is_some();
    snapshot
        .buttons()
        .skip(usize::from(has_form_inputs))
        .filter(|button| button.label().is_some())
        .take(MAX_BUTTON_SCENARIOS)
        .map(|button| {
            scenario(
                format!("Activate \"{}\"", describe(button)),
                ScenarioCategory::Functional,
                ScenarioPriority::Medium,
                vec![format!("Click \"{}\"", describe(button))],
                "The associated action takes effect",
                vec![button.index],
            )
        })
        .collect()
}

fn link_scenarios(snapshot: &StructuralSnapshot) -> Vec<Scenario> {
    snapshot
        .links()
        .filter(|link| {
            link.href
                .as_deref()
                .map(|href| !href.starts_with('#') && !href.starts_with("javascript:"))
                .unwrap_or(false)
        })
        .take(MAX_LINK_SCENARIOS)
        .enumerate()
        .map(|(position, link)| {
            scenario(
                format!("Follow the \"{}\" link", describe(link)),
                ScenarioCategory::Navigation,
                if position == 0 {
                    ScenarioPriority::Medium
                } else {
                    ScenarioPriority::Low
                },
                vec![format!("Click the \"{}\" link", describe(link))],
                format!(
                    "The browser navigates to {}",
                    link.href.as_deref().unwrap_or("the linked page")
                ),
                vec![link.index],
            )
        })
        .collect()
}

fn accessibility(snapshot: &StructuralSnapshot) -> Scenario {
    let a11y = &snapshot.accessibility;
    let mut steps = vec!["Run an automated accessibility audit".to_string()];
    if !a11y.has_lang {
        steps.push("Check the document declares a language".to_string());
    }
    if !a11y.has_single_h1 {
        steps.push("Check the page has exactly one h1".to_string());
    }
    if a11y.images_missing_alt > 0 {
        steps.push(format!("Check {} image(s) without alt text", a11y.images_missing_alt));
    }
    if a11y.unlabeled_inputs > 0 {
        steps.push(format!("Check {} unlabeled input(s)", a11y.unlabeled_inputs));
    }
    if a11y.unnamed_buttons > 0 {
        steps.push(format!("Check {} button(s) without accessible name", a11y.unnamed_buttons));
    }
    steps.push("Tab through every interactive element".to_string());

    let priority = if a11y.issue_count() > 0 {
        ScenarioPriority::High
    } else {
        ScenarioPriority::Medium
    };
    scenario(
        "Page meets basic accessibility checks",
        ScenarioCategory::Accessibility,
        priority,
        steps,
        "No accessibility violations are reported and focus order is logical",
        Vec::new(),
    )
}

fn edge_cases(snapshot: &StructuralSnapshot) -> Option<Scenario> {
    let field = snapshot
        .inputs()
        .find(|element| matches!(element.input_type.as_deref(), None | Some("text") | Some("search")) || element.tag == "textarea")?;
    Some(scenario(
        format!("Handle very long input in \"{}\"", describe(field)),
        ScenarioCategory::EdgeCase,
        ScenarioPriority::Low,
        vec![format!("Fill \"{}\" with 5000 characters", describe(field))],
        "The input is truncated or rejected gracefully without layout breakage",
        vec![field.index],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uitest_core_types::{AccessibilityFlags, StructureFlags};

    fn login_snapshot() -> StructuralSnapshot {
        let elements = vec![
            ElementInfo::new(0, "input").with_input_type("email").with_name("Email"),
            ElementInfo::new(1, "input").with_input_type("password").with_name("Password"),
            ElementInfo::new(2, "button").with_text("Sign in"),
            ElementInfo::new(3, "a").with_href("/forgot").with_text("Forgot password?"),
        ];
        StructuralSnapshot {
            url: "https://app.test/login".into(),
            title: Some("Login".into()),
            elements,
            structure: StructureFlags {
                has_forms: true,
                form_count: 1,
                ..Default::default()
            },
            accessibility: AccessibilityFlags {
                has_lang: true,
                has_single_h1: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn login_page_yields_form_validation_navigation_and_a11y() {
        let request = ScenarioRequest::new("cover login", "login").with_snapshot(login_snapshot());
        let scenarios = generate(&request);
        let categories: Vec<_> = scenarios.iter().map(|s| s.category).collect();

        assert_eq!(categories[0], ScenarioCategory::Smoke);
        assert!(categories.contains(&ScenarioCategory::Validation));
        assert!(categories.contains(&ScenarioCategory::Navigation));
        assert!(categories.contains(&ScenarioCategory::Accessibility));
        assert!(scenarios
            .iter()
            .any(|s| s.title.contains("malformed email")));
        // the only button is the form submit, so no standalone button scenario
        assert!(!scenarios.iter().any(|s| s.title.starts_with("Activate")));
    }

    #[test]
    fn without_snapshot_emits_task_scenarios() {
        let scenarios = generate(&ScenarioRequest::new("checkout with a saved card", "checkout"));
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].priority, ScenarioPriority::Critical);
        assert!(scenarios[1].title.contains("saved card"));
    }
}
