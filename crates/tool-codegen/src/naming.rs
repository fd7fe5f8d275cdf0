//! Identifier and path helpers for generated code.

fn words(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in raw.chars() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out.into_iter().map(|word| word.to_lowercase()).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `checkout flow` -> `checkout-flow`, restricted to `[a-z0-9-]`.
pub fn slug(raw: &str) -> String {
    words(raw)
        .into_iter()
        .map(|word| word.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `checkout flow` -> `CheckoutFlow`.
pub fn pascal_case(raw: &str) -> String {
    let ident: String = words(&slug(raw)).iter().map(|word| capitalize(word)).collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("N{ident}")
    } else {
        ident
    }
}

/// `Sign in now` -> `signInNow`.
pub fn camel_case(raw: &str) -> String {
    let pascal = pascal_case(raw);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Single-quoted TypeScript string literal.
pub fn ts_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cases() {
        assert_eq!(slug("Checkout Flow (v2)"), "checkout-flow-v2");
        assert_eq!(pascal_case("checkout-flow"), "CheckoutFlow");
        assert_eq!(pascal_case("2fa setup"), "N2faSetup");
        assert_eq!(camel_case("Sign in now"), "signInNow");
        assert_eq!(camel_case("submitButton"), "submitButton");
        assert_eq!(slug("  ///  "), "");
    }

    #[test]
    fn ts_strings_are_escaped() {
        assert_eq!(ts_string("it's a \\ test"), r"'it\'s a \\ test'");
    }
}
