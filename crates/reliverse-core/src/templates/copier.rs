//! Recursive directory copying

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

/// Copy every file under `source` into `target`, creating directories as
/// needed and overwriting existing files. Returns the number of files copied.
pub async fn copy_dir(source: &Path, target: &Path) -> Result<usize> {
    if !source.is_dir() {
        anyhow::bail!("Source directory does not exist: {}", source.display());
    }

    fs::create_dir_all(target)
        .await
        .with_context(|| format!("Failed to create directory: {}", target.display()))?;

    let mut copied = 0;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry =
            entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("Walked outside the source directory")?;
        let target_path = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path).await.with_context(|| {
                format!("Failed to create directory: {}", target_path.display())
            })?;
            continue;
        }

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::copy(entry.path(), &target_path)
            .await
            .with_context(|| format!("Failed to copy file: {}", entry.path().display()))?;
        copied += 1;
    }

    Ok(copied)
}

/// Remove a directory tree if it exists. Failures are reported, not raised.
pub async fn remove_dir_best_effort(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(dir).await {
        tracing::warn!("Failed to clean up {}: {}", dir.display(), e);
    }
}

/// Names directly under `dir`. Empty when `dir` cannot be read.
pub fn entry_names(dir: &Path) -> HashSet<OsString> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.file_name()).collect())
        .unwrap_or_default()
}

/// Remove every entry directly under `dir` whose name is not in `keep`.
/// Failures are reported, not raised.
pub async fn remove_entries_except(dir: &Path, keep: &HashSet<OsString>) {
    for name in entry_names(dir) {
        if keep.contains(&name) {
            continue;
        }
        let path = dir.join(&name);
        let result = match fs::symlink_metadata(&path).await {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path).await,
            Ok(_) => fs::remove_file(&path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to clean up {}: {}", path.display(), e);
        }
    }
}
