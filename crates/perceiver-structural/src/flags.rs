//! Derivation of structure and accessibility flags.

use uitest_core_types::{AccessibilityFlags, ElementInfo, PageFacts, StructureFlags};

pub fn structure_flags(elements: &[ElementInfo], facts: &PageFacts) -> StructureFlags {
    let has_landmark = |name: &str| facts.landmarks.iter().any(|landmark| landmark == name);
    let has_search_input = elements.iter().any(|element| {
        element.input_type.as_deref() == Some("search")
            || element.effective_role() == Some("searchbox")
            || element
                .label()
                .map(|label| label.to_ascii_lowercase().contains("search"))
                .unwrap_or(false)
    });

    StructureFlags {
        has_header: has_landmark("header"),
        has_navigation: has_landmark("nav"),
        has_main: has_landmark("main"),
        has_footer: has_landmark("footer"),
        has_forms: facts.form_count > 0,
        has_search: has_landmark("search") || has_search_input,
        form_count: facts.form_count,
        heading_count: facts.heading_count,
        link_count: elements.iter().filter(|element| element.is_link()).count(),
        button_count: elements.iter().filter(|element| element.is_button()).count(),
        input_count: elements.iter().filter(|element| element.is_input()).count(),
    }
}

pub fn accessibility_flags(elements: &[ElementInfo], facts: &PageFacts) -> AccessibilityFlags {
    let unnamed_buttons = elements
        .iter()
        .filter(|element| element.is_button() && element.label().is_none())
        .count();

    AccessibilityFlags {
        has_lang: facts.lang.as_deref().map(|lang| !lang.trim().is_empty()).unwrap_or(false),
        has_single_h1: facts.h1_count == 1,
        has_skip_link: facts.has_skip_link,
        landmark_count: facts
            .landmarks
            .iter()
            .filter(|landmark| landmark.as_str() != "search")
            .count(),
        images_missing_alt: facts.images_missing_alt,
        unlabeled_inputs: facts.inputs_without_label,
        unnamed_buttons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> PageFacts {
        PageFacts {
            landmarks: vec!["header".into(), "main".into(), "search".into()],
            heading_count: 3,
            h1_count: 1,
            form_count: 1,
            image_count: 2,
            images_missing_alt: 1,
            inputs_without_label: 0,
            lang: Some("en".into()),
            has_skip_link: false,
        }
    }

    #[test]
    fn counts_interactive_kinds() {
        let elements = vec![
            ElementInfo::new(0, "input").with_input_type("email"),
            ElementInfo::new(1, "button").with_text("Log in"),
            ElementInfo::new(2, "a").with_href("/help").with_text("Help"),
            ElementInfo::new(3, "button"),
        ];
        let structure = structure_flags(&elements, &facts());
        assert!(structure.has_header && structure.has_main && structure.has_search);
        assert!(!structure.has_footer);
        assert_eq!(structure.input_count, 1);
        assert_eq!(structure.button_count, 2);
        assert_eq!(structure.link_count, 1);

        let a11y = accessibility_flags(&elements, &facts());
        assert!(a11y.has_lang && a11y.has_single_h1);
        assert_eq!(a11y.unnamed_buttons, 1);
        assert_eq!(a11y.landmark_count, 2);
        assert_eq!(a11y.issue_count(), 2);
    }
}
