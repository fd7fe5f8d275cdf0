//! File-backed pattern index with lexical scoring.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::PatternError;

/// One indexed fragment: `{path, content, tags[]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in",
        "is", "it", "of", "on", "or", "that", "the", "this", "to", "we", "what", "when", "which",
        "with", "should", "existing", "test", "tests", "page",
    ]
    .into_iter()
    .collect()
});

/// Source files picked up by [`PatternIndex::scan_dir`].
const TEST_FILE_SUFFIXES: &[&str] = &[
    ".spec.ts", ".spec.js", ".test.ts", ".test.js", ".spec.tsx", ".test.tsx", ".page.ts", "Page.ts",
];

const TAG_WEIGHT: f64 = 2.0;
const SNIPPET_LINES: usize = 12;

pub(crate) fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .flat_map(split_camel)
        .map(|token| token.to_lowercase())
        .filter(|token| token.len() >= 2 && !STOPWORDS.contains(token.as_str()))
        .collect()
}

fn split_camel(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in word.chars() {
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    if parts.len() > 1 {
        parts.push(word.to_string());
    }
    parts
}

#[derive(Clone, Debug)]
struct Indexed {
    entry: PatternEntry,
    content_tokens: HashSet<String>,
    tag_tokens: HashSet<String>,
}

/// A scored hit.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredEntry {
    pub entry: PatternEntry,
    pub score: f64,
    pub snippet: String,
}

#[derive(Clone, Debug, Default)]
pub struct PatternIndex {
    entries: Vec<Indexed>,
}

impl PatternIndex {
    pub fn from_entries(entries: impl IntoIterator<Item = PatternEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| Indexed {
                content_tokens: tokenize(&format!("{} {}", entry.path, entry.content)),
                tag_tokens: entry.tags.iter().flat_map(|tag| tokenize(tag)).collect(),
                entry,
            })
            .collect();
        Self { entries }
    }

    /// Load a JSON array of entries.
    pub fn load(path: &Path) -> Result<Self, PatternError> {
        let raw = fs::read_to_string(path).map_err(|source| PatternError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<PatternEntry> = serde_json::from_str(&raw).map_err(|source| PatternError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(target: "pattern-repo", path = %path.display(), entries = entries.len(), "pattern index loaded");
        Ok(Self::from_entries(entries))
    }

    pub fn save(&self, path: &Path) -> Result<(), PatternError> {
        let entries: Vec<&PatternEntry> = self.entries.iter().map(|indexed| &indexed.entry).collect();
        let body = serde_json::to_string_pretty(&entries).map_err(|source| PatternError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PatternError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, body).map_err(|source| PatternError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Index test sources under `root`. Tags come from the directory names
    /// between `root` and the file.
    pub fn scan_dir(root: &Path) -> Result<Self, PatternError> {
        let mut files = Vec::new();
        collect_test_files(root, &mut files)?;
        files.sort();

        let mut entries = Vec::with_capacity(files.len());
        for file in files {
            let content = match fs::read_to_string(&file) {
                Ok(content) => content,
                Err(err) => {
                    warn!(target: "pattern-repo", path = %file.display(), error = %err, "skipping unreadable file");
                    continue;
                }
            };
            let relative = file.strip_prefix(root).unwrap_or(&file);
            let tags = relative
                .parent()
                .map(|dir| {
                    dir.components()
                        .filter_map(|component| component.as_os_str().to_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            entries.push(PatternEntry {
                path: relative.to_string_lossy().replace('\\', "/"),
                content,
                tags,
            });
        }
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sharing tokens with `question`, best first, ties by path.
    pub fn search(&self, question: &str, limit: usize, min_score: f64) -> Vec<ScoredEntry> {
        let query = tokenize(question);
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<ScoredEntry> = self
            .entries
            .iter()
            .filter_map(|indexed| {
                let content_hits = query.intersection(&indexed.content_tokens).count() as f64;
                let tag_hits = query.intersection(&indexed.tag_tokens).count() as f64;
                if content_hits + tag_hits == 0.0 {
                    return None;
                }
                let raw = (content_hits + TAG_WEIGHT * tag_hits) / (query.len() as f64 * (1.0 + TAG_WEIGHT));
                let score = clamp01(raw * 1.5);
                (score >= min_score).then(|| ScoredEntry {
                    snippet: best_snippet(&indexed.entry.content, &query),
                    entry: indexed.entry.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entry.path.cmp(&b.entry.path))
        });
        hits.truncate(limit);
        hits
    }
}

fn collect_test_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), PatternError> {
    let read = fs::read_dir(dir).map_err(|source| PatternError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in read.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            if name.starts_with('.') || name == "node_modules" {
                continue;
            }
            collect_test_files(&path, out)?;
        } else if TEST_FILE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            out.push(path);
        }
    }
    Ok(())
}

/// The window of lines with the most query tokens.
fn best_snippet(content: &str, query: &HashSet<String>) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= SNIPPET_LINES {
        return content.trim().to_string();
    }
    let line_hits: Vec<usize> = lines
        .iter()
        .map(|line| tokenize(line).intersection(query).count())
        .collect();

    let mut best_start = 0;
    let mut best_hits = 0;
    let mut window: usize = line_hits[..SNIPPET_LINES].iter().sum();
    if window > best_hits {
        best_hits = window;
    }
    for start in 1..=lines.len() - SNIPPET_LINES {
        window = window + line_hits[start + SNIPPET_LINES - 1] - line_hits[start - 1];
        if window > best_hits {
            best_hits = window;
            best_start = start;
        }
    }
    lines[best_start..best_start + SNIPPET_LINES].join("\n").trim().to_string()
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
