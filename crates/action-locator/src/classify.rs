//! Classification of broken selectors.

use uitest_core_types::TEST_ATTRIBUTES;

use crate::errors::LocatorError;
use crate::types::{ClassifiedSelector, SelectorKind};

pub fn classify(selector: &str) -> Result<ClassifiedSelector, LocatorError> {
    let raw = selector.trim();
    if raw.is_empty() {
        return Err(LocatorError::InvalidSelector("empty selector".into()));
    }
    let build = |kind, intent: &str, attribute: Option<&str>| ClassifiedSelector {
        raw: raw.to_string(),
        kind,
        intent: intent.trim().to_string(),
        attribute: attribute.map(str::to_string),
    };

    if let Some(text) = raw.strip_prefix("text=") {
        return Ok(build(SelectorKind::TextMatch, unquote(text), None));
    }
    if let Some(rest) = raw.strip_prefix("role=") {
        return Ok(match bracket_value(rest, "name") {
            Some(name) => build(SelectorKind::TextMatch, name, None),
            None => build(SelectorKind::Complex, rest, None),
        });
    }
    if raw.starts_with("//") || raw.starts_with("xpath=") {
        return Ok(classify_xpath(raw));
    }
    for pseudo in [":has-text(", ":text(", ":contains("] {
        if let Some(text) = call_argument(raw, pseudo) {
            return Ok(build(SelectorKind::TextMatch, text, None));
        }
    }

    if let Some(id) = raw.strip_prefix('#').filter(|id| is_ident(id)) {
        return Ok(build(SelectorKind::Id, id, None));
    }
    if let Some(class) = raw.strip_prefix('.').filter(|class| is_ident(class)) {
        return Ok(build(SelectorKind::Class, class, None));
    }
    if let Some((attribute, value)) = single_test_attribute(raw) {
        return Ok(build(SelectorKind::TestAttribute, value, Some(attribute)));
    }

    Ok(build(SelectorKind::Complex, complex_intent(raw), None))
}

fn classify_xpath(raw: &str) -> ClassifiedSelector {
    let body = raw.strip_prefix("xpath=").unwrap_or(raw);
    let (kind, intent) = if let Some(text) = call_argument(body, "text()=")
        .or_else(|| call_argument(body, "contains(text(),"))
        .or_else(|| call_argument(body, "normalize-space()="))
    {
        (SelectorKind::TextMatch, text.to_string())
    } else if let Some(id) = call_argument(body, "@id=") {
        (SelectorKind::Id, id.to_string())
    } else {
        (SelectorKind::Complex, last_quoted(body).unwrap_or(body).to_string())
    };
    ClassifiedSelector {
        raw: raw.to_string(),
        kind,
        intent,
        attribute: None,
    }
}

/// `[data-testid="x"]`, optionally tag-qualified, and nothing else.
fn single_test_attribute(raw: &str) -> Option<(&str, &str)> {
    let open = raw.find('[')?;
    let tag = &raw[..open];
    if !tag.chars().all(|c| c.is_ascii_alphanumeric()) || !raw.ends_with(']') {
        return None;
    }
    let inner = &raw[open + 1..raw.len() - 1];
    let (attribute, value) = inner.split_once('=')?;
    let attribute = attribute.trim();
    if !TEST_ATTRIBUTES.contains(&attribute) || inner.contains('[') {
        return None;
    }
    Some((attribute, unquote(value)))
}

/// Value of the last attribute, id or class in the rightmost compound.
fn complex_intent(raw: &str) -> &str {
    let compound = raw
        .rsplit(|c: char| c.is_whitespace() || c == '>' || c == '+' || c == '~' || c == ',')
        .find(|part| !part.is_empty())
        .unwrap_or(raw);
    if let Some(value) = last_quoted(compound) {
        return value;
    }
    if let Some(pos) = compound.rfind(|c| c == '#' || c == '.') {
        let tail = &compound[pos + 1..];
        let end = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(tail.len());
        if end > 0 {
            return &tail[..end];
        }
    }
    compound
}

fn bracket_value<'a>(raw: &'a str, attribute: &str) -> Option<&'a str> {
    let start = raw.find(&format!("[{attribute}="))? + attribute.len() + 2;
    let end = raw[start..].find(']')? + start;
    Some(unquote(&raw[start..end]))
}

/// Quoted (or bare) argument following `opener`, e.g. `:has-text("Save")`.
fn call_argument<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let start = raw.find(opener)? + opener.len();
    let rest = raw[start..].trim_start();
    let quote = rest.chars().next()?;
    if quote == '"' || quote == '\'' {
        let end = rest[1..].find(quote)? + 1;
        return Some(&rest[1..end]);
    }
    let end = rest.find(|c| c == ')' || c == ']').unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn last_quoted(raw: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        let Some(end) = raw.rfind(quote) else {
            continue;
        };
        if let Some(start) = raw[..end].rfind(quote) {
            return Some(&raw[start + 1..end]);
        }
    }
    None
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}

fn is_ident(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Lowercase word tokens of an identifier: `old-submitBtn` → old, submit, btn.
pub(crate) fn tokens(value: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in value.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_and_intent(raw: &str) -> (SelectorKind, String) {
        let classified = classify(raw).unwrap();
        (classified.kind, classified.intent)
    }

    #[test]
    fn simple_shapes() {
        assert_eq!(kind_and_intent("#old-submit"), (SelectorKind::Id, "old-submit".into()));
        assert_eq!(kind_and_intent(".btn-primary"), (SelectorKind::Class, "btn-primary".into()));
        assert_eq!(
            kind_and_intent("[data-testid=\"login-button\"]"),
            (SelectorKind::TestAttribute, "login-button".into())
        );
        assert_eq!(
            kind_and_intent("button[data-cy=save]"),
            (SelectorKind::TestAttribute, "save".into())
        );
    }

    #[test]
    fn text_shapes() {
        assert_eq!(kind_and_intent("text=Sign in"), (SelectorKind::TextMatch, "Sign in".into()));
        assert_eq!(
            kind_and_intent("button:has-text('Submit')"),
            (SelectorKind::TextMatch, "Submit".into())
        );
        assert_eq!(
            kind_and_intent("role=button[name=\"Save draft\"]"),
            (SelectorKind::TextMatch, "Save draft".into())
        );
        assert_eq!(
            kind_and_intent("//button[text()='Go']"),
            (SelectorKind::TextMatch, "Go".into())
        );
    }

    #[test]
    fn complex_selectors_use_rightmost_compound() {
        assert_eq!(
            kind_and_intent("form.login > button.submit-btn"),
            (SelectorKind::Complex, "submit-btn".into())
        );
        assert_eq!(
            kind_and_intent("div [aria-label=\"Close\"]"),
            (SelectorKind::Complex, "Close".into())
        );
        assert!(classify("   ").is_err());
    }

    #[test]
    fn tokens_split_case_and_punctuation() {
        assert_eq!(tokens("old-submitBtn"), vec!["old", "submit", "btn"]);
        assert_eq!(tokens("Sign in"), vec!["sign", "in"]);
    }
}
