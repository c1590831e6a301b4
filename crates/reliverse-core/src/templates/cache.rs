//! Filesystem-backed store of previously downloaded templates
//!
//! Layout under the cache root:
//!
//! ```text
//! <root>/<author>/<name>/        full copy of the template
//! <root>/<author>/<name>.json    CachedTemplateInfo
//! ```
//!
//! Metadata lives next to the copy so that restoring a template never drags
//! cache bookkeeping into the new project.

use super::copier;
use super::registry::Template;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Upstream repository state recorded when the copy was saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubInfo {
    /// Last push to the source repository, if it was known at save time
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Metadata about a locally stored template copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedTemplateInfo {
    pub template_id: String,
    pub local_path: PathBuf,
    pub github: GithubInfo,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TemplateCache {
    root: PathBuf,
}

impl TemplateCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic location of a template's cached copy
    pub fn path_for(&self, template: &Template) -> PathBuf {
        self.root.join(&template.author).join(&template.name)
    }

    fn info_path(&self, author: &str, name: &str) -> PathBuf {
        self.root.join(author).join(format!("{}.json", name))
    }

    pub async fn exists(&self, template: &Template) -> bool {
        fs::metadata(self.path_for(template))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Read the metadata recorded at save time. Missing or unreadable
    /// metadata is reported as absent.
    pub async fn info(&self, template_id: &str) -> Option<CachedTemplateInfo> {
        let (author, name) = Template::parse_id(template_id).ok()?;
        let path = self.info_path(author, name);
        let content = fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&content) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!("Ignoring unreadable cache metadata {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Replace the cached copy with the contents of `source_dir` and record
    /// the upstream push time
    pub async fn save(
        &self,
        template: &Template,
        source_dir: &Path,
        pushed_at: Option<DateTime<Utc>>,
    ) -> Result<CachedTemplateInfo> {
        let local_path = self.path_for(template);

        if fs::metadata(&local_path).await.is_ok() {
            fs::remove_dir_all(&local_path).await.with_context(|| {
                format!("Failed to remove previous copy at {}", local_path.display())
            })?;
        }

        let copied = copier::copy_dir(source_dir, &local_path).await?;
        tracing::debug!(
            "Cached {} files of {} at {}",
            copied,
            template.id,
            local_path.display()
        );

        let info = CachedTemplateInfo {
            template_id: template.id.clone(),
            local_path,
            github: GithubInfo { pushed_at },
            cached_at: Utc::now(),
        };
        let info_path = self.info_path(&template.author, &template.name);
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize cache metadata")?;
        fs::write(&info_path, json)
            .await
            .with_context(|| format!("Failed to write {}", info_path.display()))?;

        Ok(info)
    }

    /// Copy the cached template into `destination`
    pub async fn restore(&self, template: &Template, destination: &Path) -> Result<usize> {
        copier::copy_dir(&self.path_for(template), destination)
            .await
            .with_context(|| format!("Failed to restore cached template {}", template.id))
    }
}
