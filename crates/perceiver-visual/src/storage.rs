//! On-disk layout: `<root>/<check>/{baseline,current,diff}.png`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::errors::VisualError;

const BASELINE: &str = "baseline.png";
const CURRENT: &str = "current.png";
const DIFF: &str = "diff.png";

#[derive(Debug, Clone)]
pub struct BaselineStore {
    root: PathBuf,
}

impl BaselineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a check, see [`directory_name`].
    pub fn check_dir(&self, check_name: &str) -> Result<PathBuf, VisualError> {
        Ok(self.root.join(directory_name(check_name)?))
    }

    pub fn baseline_path(&self, check_name: &str) -> Result<PathBuf, VisualError> {
        Ok(self.check_dir(check_name)?.join(BASELINE))
    }

    pub fn current_path(&self, check_name: &str) -> Result<PathBuf, VisualError> {
        Ok(self.check_dir(check_name)?.join(CURRENT))
    }

    pub fn diff_path(&self, check_name: &str) -> Result<PathBuf, VisualError> {
        Ok(self.check_dir(check_name)?.join(DIFF))
    }

    pub async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, VisualError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(VisualError::io(path, err)),
        }
    }

    pub async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), VisualError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| VisualError::io(parent, err))?;
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|err| VisualError::io(path, err))
    }

    /// Remove a file if present.
    pub async fn discard(&self, path: &Path) -> Result<(), VisualError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(VisualError::io(path, err)),
        }
    }
}

pub fn sanitize(check_name: &str) -> String {
    check_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// The check name reduced to `[A-Za-z0-9_-]`. A lossy reduction gets
/// `-<8 hex of sha256(name)>` appended so that `home page` and `home_page`
/// never share a directory.
pub fn directory_name(check_name: &str) -> Result<String, VisualError> {
    let trimmed = check_name.trim();
    let sanitized = sanitize(trimmed);
    if sanitized.is_empty() {
        return Err(VisualError::InvalidInput(format!(
            "check name '{check_name}' has no usable characters"
        )));
    }
    if sanitized == trimmed {
        return Ok(sanitized);
    }
    let digest = hex::encode(Sha256::digest(trimmed.as_bytes()));
    Ok(format!("{sanitized}-{}", &digest[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_check_names() {
        assert_eq!(sanitize("home page/hero"), "home_page_hero");
        assert_eq!(sanitize("../../etc"), "etc");
        assert_eq!(sanitize("checkout-v2_final"), "checkout-v2_final");
    }

    #[test]
    fn rejects_names_without_usable_characters() {
        let store = BaselineStore::new("/tmp/baselines");
        assert!(store.check_dir("///").is_err());
        assert_eq!(
            store.baseline_path("Hero").unwrap(),
            PathBuf::from("/tmp/baselines/Hero/baseline.png")
        );
    }

    #[test]
    fn lossy_names_get_distinct_directories() {
        let plain = directory_name("home_page").unwrap();
        let spaced = directory_name("home page").unwrap();
        let nested = directory_name("home/page").unwrap();
        assert_eq!(plain, "home_page");
        assert!(spaced.starts_with("home_page-") && spaced.len() == "home_page-".len() + 8);
        assert!(nested.starts_with("home_page-"));
        assert_ne!(spaced, nested);
        assert_eq!(directory_name("  home page ").unwrap(), spaced);
    }
}
