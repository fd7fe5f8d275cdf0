//! Persistence of generated artifacts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;
use uitest_core_types::GeneratedArtifacts;

use crate::errors::CodegenError;
use crate::naming::slug;

#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Write all three artifacts and return their paths in write order.
    async fn persist(&self, team: &str, artifacts: &GeneratedArtifacts) -> Result<Vec<PathBuf>, CodegenError>;
}

/// Writes `<root>/<team>/<feature>/<relative_path>`.
#[derive(Clone, Debug)]
pub struct FsArtifactWriter {
    root: PathBuf,
}

impl FsArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn feature_dir(&self, team: &str, feature: &str) -> Result<PathBuf, CodegenError> {
        let team_slug = slug(team);
        if team_slug.is_empty() {
            return Err(CodegenError::InvalidName {
                kind: "team",
                value: team.to_string(),
            });
        }
        let feature_slug = slug(feature);
        if feature_slug.is_empty() {
            return Err(CodegenError::InvalidName {
                kind: "feature",
                value: feature.to_string(),
            });
        }
        Ok(self.root.join(team_slug).join(feature_slug))
    }
}

#[async_trait]
impl ArtifactWriter for FsArtifactWriter {
    async fn persist(&self, team: &str, artifacts: &GeneratedArtifacts) -> Result<Vec<PathBuf>, CodegenError> {
        let dir = self.feature_dir(team, &artifacts.feature_name)?;
        let mut written = Vec::with_capacity(3);
        for artifact in artifacts.iter() {
            let path = dir.join(&artifact.relative_path);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| CodegenError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            tokio::fs::write(&path, artifact.contents.as_bytes())
                .await
                .map_err(|source| CodegenError::Io {
                    path: path.clone(),
                    source,
                })?;
            written.push(path);
        }
        info!(target: "tool-codegen", dir = %dir.display(), files = written.len(), "artifacts persisted");
        Ok(written)
    }
}
