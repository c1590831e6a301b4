//! Find existing Reliverse projects around the working directory

use crate::config::{read_descriptor, ReliverseConfig};
use crate::deploy::git::{self, GitStatus};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DetectedProject {
    pub name: String,
    pub path: PathBuf,
    pub config: ReliverseConfig,
    pub git: GitStatus,
    /// `package.json` exists but `node_modules` does not
    pub needs_deps_install: bool,
}

impl DetectedProject {
    /// Short status hint shown next to the project in menus
    pub fn hint(&self) -> String {
        let mut parts = Vec::new();
        if self.git.is_repo {
            parts.push(format!(
                "{} uncommitted changes, {} unpushed commits",
                self.git.uncommitted, self.git.unpushed
            ));
        } else {
            parts.push("no git repository".to_string());
        }
        if self.needs_deps_install {
            parts.push("dependencies not installed".to_string());
        }
        parts.join("; ")
    }
}

async fn inspect(dir: &Path) -> Option<DetectedProject> {
    let config = match read_descriptor(dir) {
        Ok(Some(config)) => config,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Skipping {}: {:#}", dir.display(), e);
            return None;
        }
    };
    let name = config
        .project_name
        .clone()
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| dir.display().to_string());
    Some(DetectedProject {
        name,
        path: dir.to_path_buf(),
        git: git::status(dir).await,
        needs_deps_install: dir.join("package.json").is_file() && !dir.join("node_modules").is_dir(),
        config,
    })
}

/// The working directory itself, then its immediate subdirectories, that
/// hold a `.reliverse` descriptor. Subdirectories are sorted by name.
pub async fn detect_projects(cwd: &Path) -> Vec<DetectedProject> {
    let mut found = Vec::new();
    if let Some(project) = inspect(cwd).await {
        found.push(project);
    }

    let mut dirs: Vec<PathBuf> = match std::fs::read_dir(cwd) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", cwd.display(), e);
            return found;
        }
    };
    dirs.sort();

    for dir in dirs {
        if let Some(project) = inspect(&dir).await {
            found.push(project);
        }
    }
    found
}
