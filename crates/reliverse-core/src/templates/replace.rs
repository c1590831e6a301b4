//! Literal placeholder replacement across a materialized project

use super::registry::Template;
use crate::project::ProjectConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ordered `from -> to` string pairs with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMap {
    pairs: Vec<(String, String)>,
}

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let from = from.into();
        let to = to.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == from) {
            Some(existing) => existing.1 = to,
            None => self.pairs.push((from, to)),
        }
    }

    /// Drop pairs that would be no-ops or would erase text
    pub fn valid(self) -> Self {
        Self {
            pairs: self
                .pairs
                .into_iter()
                .filter(|(k, v)| !k.is_empty() && !v.is_empty() && k != v)
                .collect(),
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Apply every pair, in insertion order, to `content`
    pub fn apply_to(&self, content: &str) -> String {
        let mut out = content.to_string();
        for (from, to) in &self.pairs {
            if out.contains(from.as_str()) {
                out = out.replace(from.as_str(), to);
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReplacementMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Placeholders shipped in every template, mapped to the user's answers
pub fn build_replacements(template: &Template, project: &ProjectConfig) -> ReplacementMap {
    ReplacementMap::from_iter([
        (format!("{}.com", template.name), project.domain.clone()),
        (template.author.clone(), project.frontend_username.clone()),
        (template.name.clone(), project.project_name.clone()),
        ("relivator.com".to_string(), project.domain.clone()),
    ])
    .valid()
}

/// Per-file outcome of a replacement pass
#[derive(Debug, Default)]
pub struct ReplacementReport {
    /// Files whose content changed
    pub rewritten: Vec<PathBuf>,
    /// Text files with no placeholder
    pub unchanged: Vec<PathBuf>,
    /// Binary or otherwise non-UTF-8 files
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
    walked: bool,
}

impl ReplacementReport {
    /// The directory walk ran to the end. Individual files may still have
    /// failed. False when the project directory itself could not be read.
    pub fn is_complete(&self) -> bool {
        self.walked
    }

    pub fn files_seen(&self) -> usize {
        self.rewritten.len() + self.unchanged.len() + self.skipped.len() + self.failed.len()
    }
}

/// Directories never rewritten: VCS metadata and installed packages
const VENDORED_DIRS: &[&str] = &[".git", "node_modules"];

fn is_vendored(name: &std::ffi::OsStr) -> bool {
    VENDORED_DIRS.iter().any(|d| name == *d)
}

enum FileOutcome {
    Rewritten,
    Unchanged,
    NotText,
}

/// Rewrite every file under `dir`. Per-file failures are collected in the
/// report and never stop the walk.
pub async fn apply(dir: &Path, map: &ReplacementMap) -> ReplacementReport {
    let mut report = ReplacementReport::default();
    if map.is_empty() {
        report.walked = true;
        return report;
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_vendored(e.file_name())));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let root_unreadable = e.depth() == 0;
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                report.failed.push((path, e.into()));
                if root_unreadable {
                    return report;
                }
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.into_path();
        match apply_file(&path, map).await {
            Ok(FileOutcome::Rewritten) => report.rewritten.push(path),
            Ok(FileOutcome::Unchanged) => report.unchanged.push(path),
            Ok(FileOutcome::NotText) => report.skipped.push(path),
            Err(e) => {
                tracing::debug!("Replacement failed for {}: {:#}", path.display(), e);
                report.failed.push((path, e));
            }
        }
    }

    report.walked = true;
    tracing::debug!(
        "Replacement pass over {}: {} rewritten, {} failed",
        dir.display(),
        report.rewritten.len(),
        report.failed.len()
    );
    report
}

async fn apply_file(path: &Path, map: &ReplacementMap) -> Result<FileOutcome> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let Ok(content) = String::from_utf8(bytes) else {
        return Ok(FileOutcome::NotText);
    };

    let updated = map.apply_to(&content);
    if updated == content {
        return Ok(FileOutcome::Unchanged);
    }

    tokio::fs::write(path, updated)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(FileOutcome::Rewritten)
}
