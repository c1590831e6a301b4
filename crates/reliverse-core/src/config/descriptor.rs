//! The `.reliverse` project descriptor
//!
//! The same JSON document serves two purposes: it is written into every
//! generated project, and a copy in the working directory supplies defaults
//! for unattended runs.

use crate::context::DepsBehavior;
use crate::deploy::DeployService;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const DESCRIPTOR_FILE: &str = ".reliverse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoPrivacy {
    Public,
    Private,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i18n: Option<bool>,
}

/// Contents of a `.reliverse` file. Unknown keys survive a read/write cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliverseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_deploy_service: Option<DeployService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Features>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps_behavior: Option<DepsBehavior>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_prompts_use_auto_behavior: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_privacy: Option<RepoPrivacy>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReliverseConfig {
    pub fn i18n(&self) -> Option<bool> {
        self.features.as_ref().and_then(|f| f.i18n)
    }
}

pub fn descriptor_path(dir: &Path) -> PathBuf {
    dir.join(DESCRIPTOR_FILE)
}

/// Write `<dir>/.reliverse` as pretty JSON, replacing any previous file
pub fn write_descriptor(dir: &Path, config: &ReliverseConfig) -> Result<PathBuf> {
    let path = descriptor_path(dir);
    let json = serde_json::to_string_pretty(config).context("Failed to serialize .reliverse")?;
    std::fs::write(&path, json + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Read `<dir>/.reliverse`; `Ok(None)` when there is no descriptor
pub fn read_descriptor(dir: &Path) -> Result<Option<ReliverseConfig>> {
    let path = descriptor_path(dir);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(config))
}

/// User defaults from `<cwd>/.reliverse`. A missing or broken file yields
/// empty defaults.
pub fn read_config(cwd: &Path) -> ReliverseConfig {
    match read_descriptor(cwd) {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Ignoring unreadable defaults: {:#}", e);
            ReliverseConfig::default()
        }
    }
}

/// Merge `patch` into `<dir>/.reliverse`. Keys absent from the patch are kept;
/// nested objects merge recursively.
pub fn update_descriptor(dir: &Path, patch: &ReliverseConfig) -> Result<()> {
    let path = descriptor_path(dir);
    let mut current = if path.is_file() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str::<Value>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        Value::Object(Map::new())
    };

    let patch = serde_json::to_value(patch).context("Failed to serialize .reliverse patch")?;
    merge_json(&mut current, patch);

    let json = serde_json::to_string_pretty(&current).context("Failed to serialize .reliverse")?;
    std::fs::write(&path, json + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}
