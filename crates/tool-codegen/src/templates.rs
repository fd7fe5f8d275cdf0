//! Playwright/TypeScript templates.

use std::collections::{BTreeSet, HashSet};

use uitest_core_types::{ElementInfo, Scenario, ScenarioSet, StructuralSnapshot};

use crate::naming::{camel_case, pascal_case, ts_string};

/// Selector emitted for an element's page-object field.
pub fn preferred_selector(element: &ElementInfo) -> Option<String> {
    element.stable_selector()
}

/// One page-object field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Locator {
    pub element_index: usize,
    pub field: String,
    pub selector: String,
    pub kind: LocatorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocatorKind {
    Input,
    Button,
    Link,
    Other,
}

impl LocatorKind {
    fn of(element: &ElementInfo) -> Self {
        if element.is_input() {
            LocatorKind::Input
        } else if element.is_button() {
            LocatorKind::Button
        } else if element.is_link() {
            LocatorKind::Link
        } else {
            LocatorKind::Other
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            LocatorKind::Input => "Input",
            LocatorKind::Button => "Button",
            LocatorKind::Link => "Link",
            LocatorKind::Other => "Element",
        }
    }
}

/// Locators for elements the scenarios reference, else the first
/// `fallback_limit` addressable elements.
pub(crate) fn collect_locators(
    snapshot: Option<&StructuralSnapshot>,
    scenarios: &ScenarioSet,
    fallback_limit: usize,
) -> Vec<Locator> {
    let Some(snapshot) = snapshot else {
        return Vec::new();
    };
    let referenced: BTreeSet<usize> = scenarios
        .scenarios
        .iter()
        .flat_map(|scenario| scenario.element_refs.iter().copied())
        .collect();

    let chosen: Vec<&ElementInfo> = if referenced.is_empty() {
        snapshot.elements.iter().take(fallback_limit).collect()
    } else {
        snapshot
            .elements
            .iter()
            .filter(|element| referenced.contains(&element.index))
            .collect()
    };

    let mut used = HashSet::new();
    chosen
        .into_iter()
        .filter_map(|element| {
            let selector = preferred_selector(element)?;
            let kind = LocatorKind::of(element);
            let base = element
                .label()
                .map(str::to_string)
                .or_else(|| element.test_id.clone())
                .or_else(|| element.id.clone())
                .map(|label| camel_case(&label))
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("{}{}", element.tag, element.index));
            let base = format!("{base}{}", kind.suffix());
            let mut field = base.clone();
            let mut n = 2;
            while !used.insert(field.clone()) {
                field = format!("{base}{n}");
                n += 1;
            }
            Some(Locator {
                element_index: element.index,
                field,
                selector,
                kind,
            })
        })
        .collect()
}

pub(crate) fn page_object(class_name: &str, target_url: Option<&str>, locators: &[Locator]) -> String {
    let mut out = String::new();
    out.push_str("import { type Locator, type Page } from '@playwright/test';\n\n");
    out.push_str(&format!("export class {class_name} {{\n"));
    out.push_str("  readonly page: Page;\n");
    for locator in locators {
        out.push_str(&format!("  readonly {}: Locator;\n", locator.field));
    }
    out.push_str("\n  constructor(page: Page) {\n    this.page = page;\n");
    for locator in locators {
        out.push_str(&format!(
            "    this.{} = page.locator({});\n",
            locator.field,
            ts_string(&locator.selector)
        ));
    }
    out.push_str("  }\n\n");
    out.push_str(&format!(
        "  async goto(url: string = {}) {{\n    await this.page.goto(url);\n  }}\n",
        ts_string(target_url.unwrap_or("/"))
    ));

    for locator in locators {
        let method = capitalize_first(&locator.field);
        match locator.kind {
            LocatorKind::Input => out.push_str(&format!(
                "\n  async fill{method}(value: string) {{\n    await this.{}.fill(value);\n  }}\n",
                locator.field
            )),
            LocatorKind::Button | LocatorKind::Link => out.push_str(&format!(
                "\n  async click{method}() {{\n    await this.{}.click();\n  }}\n",
                locator.field
            )),
            LocatorKind::Other => {}
        }
    }
    out.push_str("}\n");
    out
}

fn capitalize_first(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sample_value(element: &ElementInfo) -> &'static str {
    match element.input_type.as_deref() {
        Some("email") => "qa.user@example.com",
        Some("password") => "Sup3r-Secret!",
        Some("tel") => "+15555550100",
        Some("number") => "42",
        Some("url") => "https://example.com",
        Some("search") => "test",
        Some("date") => "2024-01-31",
        _ => "Sample value",
    }
}

fn invalid_value(element: &ElementInfo) -> &'static str {
    match element.input_type.as_deref() {
        Some("email") => "not-an-email",
        Some("tel") => "abc",
        Some("number") => "not-a-number",
        Some("url") => "not a url",
        _ => "",
    }
}

pub(crate) fn test_data(
    const_name: &str,
    target_url: Option<&str>,
    snapshot: Option<&StructuralSnapshot>,
    locators: &[Locator],
    scenarios: &ScenarioSet,
) -> String {
    let inputs: Vec<(&Locator, &ElementInfo)> = locators
        .iter()
        .filter(|locator| locator.kind == LocatorKind::Input)
        .filter_map(|locator| {
            snapshot
                .and_then(|snapshot| {
                    snapshot
                        .elements
                        .iter()
                        .find(|element| element.index == locator.element_index)
                })
                .map(|element| (locator, element))
        })
        .collect();

    let mut out = format!("export const {const_name} = {{\n");
    out.push_str(&format!("  url: {},\n", ts_string(target_url.unwrap_or("/"))));
    out.push_str("  valid: {\n");
    for (locator, element) in &inputs {
        out.push_str(&format!("    {}: {},\n", locator.field, ts_string(sample_value(element))));
    }
    out.push_str("  },\n  invalid: {\n");
    for (locator, element) in &inputs {
        out.push_str(&format!("    {}: {},\n", locator.field, ts_string(invalid_value(element))));
    }
    out.push_str("  },\n  longText: 'x'.repeat(5000),\n  scenarios: [\n");
    for scenario in &scenarios.scenarios {
        out.push_str(&format!(
            "    {{ id: {}, title: {}, category: {}, priority: {} }},\n",
            ts_string(&scenario.id),
            ts_string(&scenario.title),
            ts_string(scenario.category.as_str()),
            ts_string(scenario.priority.as_str()),
        ));
    }
    out.push_str("  ],\n} as const;\n");
    out
}

pub(crate) struct SpecContext<'a> {
    pub feature_name: &'a str,
    pub class_name: &'a str,
    pub page_module: &'a str,
    pub data_const: &'a str,
    pub data_module: &'a str,
    pub locators: &'a [Locator],
    pub snapshot_title: Option<&'a str>,
}

pub(crate) fn test_spec(ctx: &SpecContext<'_>, scenarios: &ScenarioSet) -> String {
    let instance = camel_case(ctx.class_name);
    let mut out = String::new();
    out.push_str("import { expect, test } from '@playwright/test';\n");
    out.push_str(&format!(
        "import {{ {} }} from {};\nimport {{ {} }} from {};\n\n",
        ctx.class_name,
        ts_string(ctx.page_module),
        ctx.data_const,
        ts_string(ctx.data_module)
    ));
    out.push_str(&format!("test.describe({}, () => {{\n", ts_string(ctx.feature_name)));
    out.push_str(&format!("  let {instance}: {};\n\n", ctx.class_name));
    out.push_str(&format!(
        "  test.beforeEach(async ({{ page }}) => {{\n    {instance} = new {}(page);\n    await {instance}.goto({}.url);\n  }});\n",
        ctx.class_name, ctx.data_const
    ));

    for (category, group) in scenarios.grouped() {
        out.push_str(&format!("\n  test.describe({}, () => {{\n", ts_string(category.as_str())));
        for scenario in group {
            out.push_str(&scenario_test(ctx, &instance, scenario));
        }
        out.push_str("  });\n");
    }
    out.push_str("});\n");
    out
}

fn scenario_test(ctx: &SpecContext<'_>, instance: &str, scenario: &Scenario) -> String {
    let title = format!("{} {} {}", scenario.priority.tag(), scenario.id, scenario.title);
    let mut body = format!("    test({}, async ({{ page }}) => {{\n", ts_string(&title));
    for step in &scenario.steps {
        body.push_str(&format!("      // {}\n", step.replace('\n', " ")));
    }

    let refs: Vec<&Locator> = scenario
        .element_refs
        .iter()
        .filter_map(|index| ctx.locators.iter().find(|locator| locator.element_index == *index))
        .collect();
    let invalid = scenario.category == uitest_core_types::ScenarioCategory::Validation;
    for locator in &refs {
        body.push_str(&format!("      await expect({instance}.{}).toBeVisible();\n", locator.field));
    }
    for locator in &refs {
        let method = capitalize_first(&locator.field);
        match locator.kind {
            LocatorKind::Input => {
                let source = if invalid { "invalid" } else { "valid" };
                body.push_str(&format!(
                    "      await {instance}.fill{method}({}.{source}.{});\n",
                    ctx.data_const, locator.field
                ));
            }
            LocatorKind::Button | LocatorKind::Link => {
                body.push_str(&format!("      await {instance}.click{method}();\n"));
            }
            LocatorKind::Other => {}
        }
    }

    if !scenario.expected.is_empty() {
        body.push_str(&format!("      // expected: {}\n", scenario.expected.replace('\n', " ")));
    }
    match (scenario.category, ctx.snapshot_title) {
        (uitest_core_types::ScenarioCategory::Smoke, Some(title)) => {
            body.push_str(&format!("      await expect(page).toHaveTitle({});\n", ts_string(title)));
        }
        _ => body.push_str("      await expect(page).not.toHaveURL('about:blank');\n"),
    }
    body.push_str("    });\n");
    body
}

pub(crate) fn class_name(feature: &str) -> String {
    format!("{}Page", pascal_case(feature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_preference_order() {
        let with_test_id = ElementInfo::new(0, "button").with_test_id("save").with_id("btn-save");
        assert_eq!(preferred_selector(&with_test_id).as_deref(), Some("[data-testid=\"save\"]"));

        let with_id = ElementInfo::new(1, "input").with_id("email");
        assert_eq!(preferred_selector(&with_id).as_deref(), Some("#email"));

        let with_role = ElementInfo::new(2, "button").with_text("Save draft");
        assert_eq!(
            preferred_selector(&with_role).as_deref(),
            Some("role=button[name=\"Save draft\"]")
        );

        let bare = ElementInfo::new(3, "div");
        assert_eq!(preferred_selector(&bare), None);
    }

    #[test]
    fn locator_fields_are_unique() {
        let snapshot = StructuralSnapshot {
            elements: vec![
                ElementInfo::new(0, "button").with_text("Save").with_id("a"),
                ElementInfo::new(1, "button").with_text("Save").with_id("b"),
            ],
            ..Default::default()
        };
        let locators = collect_locators(Some(&snapshot), &ScenarioSet::default(), 10);
        let fields: Vec<_> = locators.iter().map(|l| l.field.as_str()).collect();
        assert_eq!(fields, vec!["saveButton", "saveButton2"]);
    }
}
