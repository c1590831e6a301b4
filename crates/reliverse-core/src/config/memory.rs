//! Per-user credential memory at `<home>/.reliverse/memory.json`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliverseMemory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vercel_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("memory.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored memory; missing or corrupt files read as empty
    pub fn load(&self) -> ReliverseMemory {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return ReliverseMemory::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring corrupt {}: {}", self.path.display(), e);
            ReliverseMemory::default()
        })
    }

    pub fn save(&self, memory: &ReliverseMemory) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(memory).context("Failed to serialize memory")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Load, modify and save in one step
    pub fn update(&self, f: impl FnOnce(&mut ReliverseMemory)) -> Result<ReliverseMemory> {
        let mut memory = self.load();
        f(&mut memory);
        self.save(&memory)?;
        Ok(memory)
    }
}

/// Token lookup: a non-empty environment variable wins over the stored value
pub fn resolve_token(env_var: &str, stored: Option<&str>) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| stored.filter(|v| !v.is_empty()).map(str::to_string))
}
