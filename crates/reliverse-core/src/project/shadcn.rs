//! shadcn/ui component management

use crate::runtime::{self, tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Components offered by the add action
pub const AVAILABLE_COMPONENTS: &[&str] = &[
    "accordion",
    "alert",
    "alert-dialog",
    "avatar",
    "badge",
    "breadcrumb",
    "button",
    "calendar",
    "card",
    "carousel",
    "checkbox",
    "collapsible",
    "command",
    "context-menu",
    "dialog",
    "drawer",
    "dropdown-menu",
    "form",
    "hover-card",
    "input",
    "label",
    "menubar",
    "navigation-menu",
    "pagination",
    "popover",
    "progress",
    "radio-group",
    "scroll-area",
    "select",
    "separator",
    "sheet",
    "skeleton",
    "slider",
    "sonner",
    "switch",
    "table",
    "tabs",
    "textarea",
    "toggle",
    "tooltip",
];

const CONFIG_FILE: &str = "components.json";
const DEFAULT_UI_DIR: &str = "src/components/ui";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShadcnConfig {
    #[serde(default)]
    pub aliases: Aliases,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Aliases {
    pub ui: Option<String>,
}

/// `components.json`, or `None` when the project does not use shadcn/ui
pub fn read_config(project_dir: &Path) -> Result<Option<ShadcnConfig>> {
    let path = project_dir.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(config))
}

/// Directory holding the component sources. The `@/` alias points at
/// `src/` when the project has one.
pub fn ui_dir(project_dir: &Path, config: &ShadcnConfig) -> PathBuf {
    let Some(alias) = config.aliases.ui.as_deref() else {
        return project_dir.join(DEFAULT_UI_DIR);
    };
    match alias.strip_prefix("@/") {
        Some(rest) if project_dir.join("src").is_dir() => project_dir.join("src").join(rest),
        Some(rest) => project_dir.join(rest),
        None => project_dir.join(alias.trim_start_matches("./")),
    }
}

/// Names of `<ui dir>/*.tsx`, sorted
pub fn installed_components(project_dir: &Path, config: &ShadcnConfig) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(ui_dir(project_dir, config)) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "tsx"))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect();
    names.sort();
    names
}

/// Catalog entries not installed yet
pub fn addable_components(installed: &[String]) -> Vec<&'static str> {
    AVAILABLE_COMPONENTS
        .iter()
        .copied()
        .filter(|c| !installed.iter().any(|i| i == c))
        .collect()
}

async fn run_shadcn(project_dir: &Path, components: &[String], overwrite: bool) -> Result<()> {
    if components.is_empty() {
        return Ok(());
    }
    let pm = runtime::detect_package_manager(project_dir);
    let (program, prefix) = pm.dlx();
    let mut args: Vec<&str> = prefix.to_vec();
    args.extend(["shadcn@latest", "add", "--yes"]);
    if overwrite {
        args.push("--overwrite");
    }
    args.extend(components.iter().map(String::as_str));
    tool::run_streaming(program, &args, project_dir).await
}

pub async fn add_components(project_dir: &Path, components: &[String]) -> Result<()> {
    run_shadcn(project_dir, components, false).await
}

/// Reinstall components over their current sources
pub async fn update_components(project_dir: &Path, components: &[String]) -> Result<()> {
    run_shadcn(project_dir, components, true).await
}

/// Delete component sources. Returns the names that were removed.
pub fn remove_components(
    project_dir: &Path,
    config: &ShadcnConfig,
    components: &[String],
) -> Result<Vec<String>> {
    let dir = ui_dir(project_dir, config);
    let mut removed = Vec::new();
    for name in components {
        let file = dir.join(format!("{}.tsx", name));
        if !file.is_file() {
            tracing::debug!("Component {} not found at {}", name, file.display());
            continue;
        }
        std::fs::remove_file(&file)
            .with_context(|| format!("Failed to remove {}", file.display()))?;
        removed.push(name.clone());
    }
    Ok(removed)
}
