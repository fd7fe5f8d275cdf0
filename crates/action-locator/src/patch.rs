//! Backup and in-place substitution of selector literals.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::LocatorError;

/// `<file>.<YYYYmmddHHMMSSfff>.bak` next to the source.
pub fn backup_path(source: &Path, at: DateTime<Local>) -> PathBuf {
    numbered_backup_path(source, at, 0)
}

/// `attempt` 0 is the plain name; later attempts insert `-<n>` before `.bak`.
fn numbered_backup_path(source: &Path, at: DateTime<Local>, attempt: u32) -> PathBuf {
    let stamp = at.format("%Y%m%d%H%M%S%3f");
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    if attempt == 0 {
        source.with_file_name(format!("{name}.{stamp}.bak"))
    } else {
        source.with_file_name(format!("{name}.{stamp}-{attempt}.bak"))
    }
}

const QUOTES: [char; 3] = ['\'', '"', '`'];

/// A complete string literal whose body is exactly the selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LiteralMatch {
    /// Byte offset of the selector text, just past the opening quote.
    pub start: usize,
    pub quote: char,
}

/// Every `'raw'`, `"raw"` or `` `raw` `` in `contents`. Longer literals that
/// only start with or contain `raw` do not count.
pub(crate) fn find_literals(contents: &str, raw: &str) -> Vec<LiteralMatch> {
    if raw.is_empty() {
        return Vec::new();
    }
    contents
        .match_indices(raw)
        .filter_map(|(start, _)| {
            let before = contents[..start].chars().next_back()?;
            let after = contents[start + raw.len()..].chars().next()?;
            (before == after && QUOTES.contains(&before)).then_some(LiteralMatch { start, quote: before })
        })
        .collect()
}

pub(crate) fn contains_literal(contents: &str, raw: &str) -> bool {
    !find_literals(contents, raw).is_empty()
}

/// Rewrite quotes inside `replacement` so it can sit in the string literal
/// that currently holds `original`.
pub fn fit_to_literal(contents: &str, original: &str, replacement: &str) -> String {
    let enclosing = find_literals(contents, original).first().map(|found| found.quote);
    match enclosing {
        Some('"') if replacement.contains('"') => replacement.replace('"', "'"),
        Some('\'') if replacement.contains('\'') => replacement.replace('\'', "\""),
        _ => replacement.to_string(),
    }
}

/// `contents` with the body of every literal equal to `original` swapped.
fn replace_literals(contents: &str, original: &str, replacement: &str) -> (String, usize) {
    let found = find_literals(contents, original);
    let mut patched = String::with_capacity(contents.len() + found.len() * replacement.len());
    let mut cursor = 0;
    for literal in &found {
        patched.push_str(&contents[cursor..literal.start]);
        patched.push_str(replacement);
        cursor = literal.start + original.len();
    }
    patched.push_str(&contents[cursor..]);
    (patched, found.len())
}

/// Writes `contents` to a fresh backup path. Never overwrites an earlier backup.
async fn write_backup(source: &Path, contents: &str, at: DateTime<Local>) -> Result<PathBuf, LocatorError> {
    let mut attempt = 0;
    loop {
        let candidate = numbered_backup_path(source, at, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&candidate).await {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())
                    .await
                    .map_err(|err| LocatorError::io(&candidate, err))?;
                file.flush().await.map_err(|err| LocatorError::io(&candidate, err))?;
                return Ok(candidate);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => return Err(LocatorError::io(&candidate, err)),
        }
    }
}

pub(crate) struct Applied {
    pub backup: PathBuf,
    pub replacements: usize,
}

/// Back up `source`, then replace every string literal equal to `original`.
pub(crate) async fn apply(
    source: &Path,
    contents: &str,
    original: &str,
    replacement: &str,
) -> Result<Applied, LocatorError> {
    let (patched, replacements) = replace_literals(contents, original, replacement);
    if replacements == 0 {
        return Err(LocatorError::Internal(format!(
            "'{original}' vanished from {} before patching",
            source.display()
        )));
    }

    let backup = write_backup(source, contents, Local::now()).await?;
    tokio::fs::write(source, patched.as_bytes())
        .await
        .map_err(|err| LocatorError::io(source, err))?;

    debug!(
        target: "action-locator",
        source = %source.display(),
        backup = %backup.display(),
        replacements,
        "source patched"
    );
    Ok(Applied { backup, replacements })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn backup_name_carries_millisecond_stamp() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .unwrap()
            + chrono::Duration::milliseconds(42);
        let path = backup_path(Path::new("/tmp/tests/login.spec.ts"), at);
        assert_eq!(path, PathBuf::from("/tmp/tests/login.spec.ts.20240309140507042.bak"));
    }

    #[test]
    fn replacement_quotes_follow_the_literal() {
        let double = r##"page.locator("#old-submit")"##;
        assert_eq!(
            fit_to_literal(double, "#old-submit", r#"[data-testid="submit-button"]"#),
            "[data-testid='submit-button']"
        );
        let single = "page.locator('#old-submit')";
        assert_eq!(
            fit_to_literal(single, "#old-submit", r#"[data-testid="submit-button"]"#),
            r#"[data-testid="submit-button"]"#
        );
    }

    #[tokio::test]
    async fn apply_counts_every_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.spec.ts");
        let contents = "click('#go');\nexpect('#go');\n";
        std::fs::write(&file, contents).unwrap();

        let applied = apply(&file, contents, "#go", "#start").await.unwrap();
        assert_eq!(applied.replacements, 2);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "click('#start');\nexpect('#start');\n");
        assert_eq!(std::fs::read_to_string(&applied.backup).unwrap(), contents);
    }

    #[test]
    fn only_whole_literals_match() {
        let contents = "locator('#submit');\nlocator(\"#submit-later\");\nlocator(`#submit`);\nconst a = '#submit\";\n";
        let found = find_literals(contents, "#submit");
        assert_eq!(found.iter().map(|found| found.quote).collect::<Vec<_>>(), vec!['\'', '`']);
        assert!(!contains_literal("locator('#submit-order')", "#submit"));
        assert!(!contains_literal("#submit", "#submit"));
    }

    #[tokio::test]
    async fn prefixes_of_other_selectors_are_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("order.spec.ts");
        let contents = "click('#submit');\nclick('#submit-later');\n";
        std::fs::write(&file, contents).unwrap();

        let applied = apply(&file, contents, "#submit", "#submit-order").await.unwrap();
        assert_eq!(applied.replacements, 1);
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "click('#submit-order');\nclick('#submit-later');\n"
        );
    }

    #[tokio::test]
    async fn backups_in_the_same_millisecond_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.spec.ts");
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).single().unwrap();

        let first = write_backup(&file, "original", at).await.unwrap();
        let second = write_backup(&file, "patched once", at).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(second, dir.path().join("a.spec.ts.20240309140507000-1.bak"));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "original");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "patched once");
    }
}
