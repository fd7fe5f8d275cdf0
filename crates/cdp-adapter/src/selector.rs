//! Selector grammar understood by [`crate::PageHandle::count_matches`].
//!
//! Three shapes are accepted: plain CSS, `text=Visible text` (quoted value
//! means exact match, bare value means case-insensitive containment) and
//! `role=button[name="Label"]`.

use serde::{Deserialize, Serialize};
use uitest_core_types::ElementInfo;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SelectorQuery {
    Css { selector: String },
    Text { value: String, exact: bool },
    Role { role: String, name: Option<String> },
}

impl SelectorQuery {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix("text=") {
            let rest = rest.trim();
            return match unquote(rest) {
                Some(value) => SelectorQuery::Text {
                    value: value.to_string(),
                    exact: true,
                },
                None => SelectorQuery::Text {
                    value: rest.to_string(),
                    exact: false,
                },
            };
        }
        if let Some(rest) = trimmed.strip_prefix("role=") {
            let (role, name) = match rest.find('[') {
                Some(open) => {
                    let role = rest[..open].trim();
                    let body = rest[open + 1..].trim_end().trim_end_matches(']');
                    let name = body
                        .trim()
                        .strip_prefix("name")
                        .map(|tail| tail.trim_start().trim_start_matches('=').trim())
                        .map(|value| unquote(value).unwrap_or(value).to_string());
                    (role, name)
                }
                None => (rest.trim(), None),
            };
            return SelectorQuery::Role {
                role: role.to_ascii_lowercase(),
                name,
            };
        }
        SelectorQuery::Css {
            selector: trimmed.to_string(),
        }
    }

    /// Match against a captured element. CSS support covers compound
    /// selectors (tag, `#id`, `.class`, attribute tests) and comma lists;
    /// for combinators only the rightmost compound is checked.
    pub fn matches(&self, element: &ElementInfo) -> bool {
        match self {
            SelectorQuery::Text { value, exact } => {
                let Some(text) = element.visible_text().or(element.label()) else {
                    return false;
                };
                if *exact {
                    text == value.trim()
                } else {
                    text.to_lowercase().contains(&value.trim().to_lowercase())
                }
            }
            SelectorQuery::Role { role, name } => {
                let role_matches = element
                    .effective_role()
                    .map(|actual| actual.eq_ignore_ascii_case(role))
                    .unwrap_or(false);
                let name_matches = match name {
                    Some(expected) => element
                        .label()
                        .map(|label| label.trim().eq_ignore_ascii_case(expected.trim()))
                        .unwrap_or(false),
                    None => true,
                };
                role_matches && name_matches
            }
            SelectorQuery::Css { selector } => split_top_level(selector, |c| c == ',')
                .iter()
                .filter_map(|alternative| {
                    split_top_level(alternative, |c| c.is_whitespace() || matches!(c, '>' | '+' | '~'))
                        .pop()
                })
                .filter_map(|compound| Compound::parse(&compound))
                .any(|compound| compound.matches(element)),
        }
    }
}

fn unquote(value: &str) -> Option<&str> {
    let value = value.trim();
    if value.len() >= 2 {
        let first = value.chars().next()?;
        if (first == '"' || first == '\'') && value.ends_with(first) {
            return Some(&value[1..value.len() - 1]);
        }
    }
    None
}

/// Split outside brackets, parentheses and quotes; empty parts are dropped.
fn split_top_level(input: &str, is_separator: impl Fn(char) -> bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' => {
                depth -= 1;
                current.push(ch);
            }
            c if depth == 0 && is_separator(c) => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
            }
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

#[derive(Debug, Clone)]
struct AttrTest {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

impl Compound {
    fn parse(input: &str) -> Option<Self> {
        let chars: Vec<char> = input.chars().collect();
        let mut compound = Compound::default();
        let mut idx = 0;

        if idx < chars.len() && chars[idx] == '*' {
            idx += 1;
        } else if idx < chars.len() && chars[idx].is_alphabetic() {
            let (tag, next) = read_ident(&chars, idx);
            compound.tag = Some(tag.to_ascii_lowercase());
            idx = next;
        }

        while idx < chars.len() {
            match chars[idx] {
                '#' => {
                    let (id, next) = read_ident(&chars, idx + 1);
                    if id.is_empty() {
                        return None;
                    }
                    compound.id = Some(id);
                    idx = next;
                }
                '.' => {
                    let (class, next) = read_ident(&chars, idx + 1);
                    if class.is_empty() {
                        return None;
                    }
                    compound.classes.push(class);
                    idx = next;
                }
                '[' => {
                    let close = find_closing_bracket(&chars, idx)?;
                    let body: String = chars[idx + 1..close].iter().collect();
                    compound.attrs.push(parse_attr(&body)?);
                    idx = close + 1;
                }
                ':' => {
                    // pseudo-classes do not narrow the match
                    let (_, mut next) = read_ident(&chars, idx + 1);
                    if next < chars.len() && chars[next] == '(' {
                        let mut depth = 0;
                        while next < chars.len() {
                            match chars[next] {
                                '(' => depth += 1,
                                ')' => {
                                    depth -= 1;
                                    if depth == 0 {
                                        next += 1;
                                        break;
                                    }
                                }
                                _ => {}
                            }
                            next += 1;
                        }
                    }
                    idx = next;
                }
                _ => return None,
            }
        }
        Some(compound)
    }

    fn matches(&self, element: &ElementInfo) -> bool {
        if let Some(tag) = &self.tag {
            if &element.tag != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|class| element.classes.iter().any(|have| have == class))
        {
            return false;
        }
        self.attrs.iter().all(|test| test.matches(element))
    }
}

fn find_closing_bracket(chars: &[char], open: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, &ch) in chars[open + 1..].iter().enumerate() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == ']' => return Some(open + 1 + offset),
            None => {}
        }
    }
    None
}

fn parse_attr(body: &str) -> Option<AttrTest> {
    let Some(eq) = body.find('=') else {
        let name = body.trim();
        if name.is_empty() {
            return None;
        }
        return Some(AttrTest {
            name: name.to_ascii_lowercase(),
            op: AttrOp::Exists,
            value: String::new(),
        });
    };
    let (op, name_end) = match body[..eq].chars().last() {
        Some('*') => (AttrOp::Contains, eq - 1),
        Some('^') => (AttrOp::Prefix, eq - 1),
        Some('$') => (AttrOp::Suffix, eq - 1),
        Some('~') => (AttrOp::Word, eq - 1),
        _ => (AttrOp::Equals, eq),
    };
    let name = body[..name_end].trim().to_ascii_lowercase();
    let raw_value = body[eq + 1..].trim();
    let raw_value = raw_value
        .strip_suffix(" i")
        .map(str::trim_end)
        .unwrap_or(raw_value);
    let value = unquote(raw_value).unwrap_or(raw_value).to_string();
    if name.is_empty() {
        return None;
    }
    Some(AttrTest { name, op, value })
}

impl AttrTest {
    fn matches(&self, element: &ElementInfo) -> bool {
        let Some(actual) = attribute_value(element, &self.name) else {
            return false;
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            AttrOp::Contains => actual.contains(&self.value),
            AttrOp::Prefix => actual.starts_with(&self.value),
            AttrOp::Suffix => actual.ends_with(&self.value),
            AttrOp::Word => actual.split_whitespace().any(|word| word == self.value),
        }
    }
}

fn attribute_value(element: &ElementInfo, name: &str) -> Option<String> {
    match name {
        "id" => element.id.clone(),
        "class" if !element.classes.is_empty() => Some(element.classes.join(" ")),
        "role" => element.role.clone(),
        "type" => element.input_type.clone(),
        "href" => element.href.clone(),
        "placeholder" => element.placeholder.clone(),
        "aria-label" | "name" => element.name.clone(),
        other if element.test_attribute.as_deref() == Some(other) => element.test_id.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit_button() -> ElementInfo {
        ElementInfo::new(0, "button")
            .with_text("Submit order")
            .with_test_id("submit-button")
            .with_classes(["btn", "btn-primary"])
    }

    #[test]
    fn parses_text_and_role_selectors() {
        assert_eq!(
            SelectorQuery::parse("text=\"Sign in\""),
            SelectorQuery::Text {
                value: "Sign in".into(),
                exact: true
            }
        );
        assert_eq!(
            SelectorQuery::parse("role=button[name=\"Save\"]"),
            SelectorQuery::Role {
                role: "button".into(),
                name: Some("Save".into())
            }
        );
        assert!(matches!(SelectorQuery::parse("#login"), SelectorQuery::Css { .. }));
    }

    #[test]
    fn css_compound_matching() {
        let element = submit_button();
        assert!(SelectorQuery::parse("[data-testid=\"submit-button\"]").matches(&element));
        assert!(SelectorQuery::parse("button.btn.btn-primary").matches(&element));
        assert!(SelectorQuery::parse("form > .btn-primary").matches(&element));
        assert!(SelectorQuery::parse("#nope, [data-testid^='submit']").matches(&element));
        assert!(!SelectorQuery::parse("#old-submit").matches(&element));
        assert!(!SelectorQuery::parse("a.btn").matches(&element));
    }

    #[test]
    fn text_and_role_matching() {
        let element = submit_button();
        assert!(SelectorQuery::parse("text=submit").matches(&element));
        assert!(!SelectorQuery::parse("text=\"Submit\"").matches(&element));
        assert!(SelectorQuery::parse("role=button[name=\"Submit order\"]").matches(&element));
        assert!(!SelectorQuery::parse("role=link").matches(&element));
    }
}
