//! Structural page snapshot produced by the page inspector.

use serde::{Deserialize, Serialize};

/// Attributes recognised as explicit test hooks, in preference order.
pub const TEST_ATTRIBUTES: &[&str] = &["data-testid", "data-test-id", "data-test", "data-cy", "data-qa"];

/// One interactive element captured from the live page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Position among interactive elements in DOM order.
    pub index: usize,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Value of the first test attribute found on the element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    /// Name of the attribute that carried `test_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Accessible name (aria-label, label text or alt).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl ElementInfo {
    pub fn new(index: usize, tag: impl Into<String>) -> Self {
        Self {
            index,
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_test_id(mut self, value: impl Into<String>) -> Self {
        self.test_id = Some(value.into());
        self.test_attribute = Some(TEST_ATTRIBUTES[0].to_string());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Trimmed visible text, if any.
    pub fn visible_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Best human label: accessible name, then text, then placeholder.
    pub fn label(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or_else(|| self.visible_text())
            .or_else(|| self.placeholder.as_deref())
    }

    /// Role implied by tag when no explicit role is present.
    pub fn effective_role(&self) -> Option<&str> {
        if let Some(role) = self.role.as_deref() {
            return Some(role);
        }
        match self.tag.as_str() {
            "button" => Some("button"),
            "a" if self.href.is_some() => Some("link"),
            "select" => Some("combobox"),
            "textarea" => Some("textbox"),
            "input" => match self.input_type.as_deref().unwrap_or("text") {
                "checkbox" => Some("checkbox"),
                "radio" => Some("radio"),
                "submit" | "button" | "reset" => Some("button"),
                "search" => Some("searchbox"),
                _ => Some("textbox"),
            },
            _ => None,
        }
    }

    /// Most stable selector for this element: test attribute, id, role with
    /// accessible name, then visible text.
    pub fn stable_selector(&self) -> Option<String> {
        if let (Some(attr), Some(value)) = (&self.test_attribute, &self.test_id) {
            return Some(format!("[{attr}=\"{value}\"]"));
        }
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return Some(format!("#{id}"));
        }
        if let (Some(role), Some(name)) = (self.effective_role(), self.label()) {
            return Some(format!("role={role}[name=\"{}\"]", name.replace('"', "\\\"")));
        }
        self.visible_text().map(|text| format!("text={text}"))
    }

    pub fn is_input(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }

    pub fn is_link(&self) -> bool {
        self.tag == "a"
    }

    pub fn is_button(&self) -> bool {
        self.effective_role() == Some("button")
    }
}

/// Page-level facts gathered by the driver alongside the element list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFacts {
    /// Landmark names present on the page (`header`, `nav`, `main`, ...).
    #[serde(default)]
    pub landmarks: Vec<String>,
    #[serde(default)]
    pub heading_count: usize,
    #[serde(default)]
    pub h1_count: usize,
    #[serde(default)]
    pub form_count: usize,
    #[serde(default)]
    pub image_count: usize,
    #[serde(default)]
    pub images_missing_alt: usize,
    #[serde(default)]
    pub inputs_without_label: usize,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub has_skip_link: bool,
}

/// Coarse structure of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureFlags {
    pub has_header: bool,
    pub has_navigation: bool,
    pub has_main: bool,
    pub has_footer: bool,
    pub has_forms: bool,
    pub has_search: bool,
    pub form_count: usize,
    pub heading_count: usize,
    pub link_count: usize,
    pub button_count: usize,
    pub input_count: usize,
}

/// Accessibility hints derived from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityFlags {
    pub has_lang: bool,
    pub has_single_h1: bool,
    pub has_skip_link: bool,
    pub landmark_count: usize,
    pub images_missing_alt: usize,
    pub unlabeled_inputs: usize,
    pub unnamed_buttons: usize,
}

impl AccessibilityFlags {
    /// Number of concrete accessibility problems found.
    pub fn issue_count(&self) -> usize {
        let mut issues = self.images_missing_alt + self.unlabeled_inputs + self.unnamed_buttons;
        if !self.has_lang {
            issues += 1;
        }
        if !self.has_single_h1 {
            issues += 1;
        }
        issues
    }
}

/// `{url, title, elements[], structure_flags, accessibility_flags}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub elements: Vec<ElementInfo>,
    #[serde(default)]
    pub structure: StructureFlags,
    #[serde(default)]
    pub accessibility: AccessibilityFlags,
}

impl StructuralSnapshot {
    pub fn inputs(&self) -> impl Iterator<Item = &ElementInfo> {
        self.elements.iter().filter(|element| element.is_input())
    }

    pub fn buttons(&self) -> impl Iterator<Item = &ElementInfo> {
        self.elements.iter().filter(|element| element.is_button())
    }

    pub fn links(&self) -> impl Iterator<Item = &ElementInfo> {
        self.elements.iter().filter(|element| element.is_link())
    }

    /// One-line description used in prompts and logs.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} interactive elements, {} inputs, {} buttons, {} links, {} forms, {} a11y issues",
            self.title.as_deref().unwrap_or("untitled"),
            self.url,
            self.elements.len(),
            self.structure.input_count,
            self.structure.button_count,
            self.structure.link_count,
            self.structure.form_count,
            self.accessibility.issue_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_role_follows_tag_semantics() {
        let submit = ElementInfo::new(0, "INPUT").with_input_type("submit");
        assert_eq!(submit.tag, "input");
        assert_eq!(submit.effective_role(), Some("button"));
        assert!(submit.is_button());

        let link = ElementInfo::new(1, "a").with_href("/home");
        assert_eq!(link.effective_role(), Some("link"));

        let custom = ElementInfo::new(2, "div").with_role("tab");
        assert_eq!(custom.effective_role(), Some("tab"));
    }

    #[test]
    fn label_prefers_accessible_name() {
        let element = ElementInfo::new(0, "button")
            .with_text("  Go  ")
            .with_name("Search the catalogue");
        assert_eq!(element.label(), Some("Search the catalogue"));

        let bare = ElementInfo::new(1, "button").with_text("  Go  ");
        assert_eq!(bare.label(), Some("Go"));
    }

    #[test]
    fn accessibility_issue_count_adds_missing_lang_and_h1() {
        let flags = AccessibilityFlags {
            has_lang: false,
            has_single_h1: false,
            images_missing_alt: 2,
            ..Default::default()
        };
        assert_eq!(flags.issue_count(), 4);
    }
}
