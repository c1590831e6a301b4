//! Template scripts offered once dependencies are installed

use crate::error::Result;
use crate::prompt::{Prompter, SelectOption};
use crate::runtime::{self, PackageManager};
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Scripts worth running right after creation, in the order they run
pub const KNOWN_SCRIPTS: &[(&str, &str)] = &[
    ("latest", "Update dependencies to their latest versions"),
    ("db:push", "Push the database schema"),
    ("check", "Lint and format the code"),
    ("typecheck", "Check types"),
];

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: BTreeMap<String, String>,
}

/// Outcome of the scripts stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptsOutcome {
    /// The template defines none of the known scripts
    NoneAvailable,
    /// Unattended run, or the user picked nothing
    NoneChosen,
    Ran(Vec<String>),
    Failed { ran: Vec<String>, failed: Vec<String> },
}

/// `scripts` of `package.json`. A project without one has no scripts.
pub fn read_scripts(project_dir: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let path = project_dir.join("package.json");
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest: PackageJson = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(manifest.scripts)
}

/// Known scripts the project defines
pub fn available_scripts(scripts: &BTreeMap<String, String>) -> Vec<(&'static str, &'static str)> {
    KNOWN_SCRIPTS
        .iter()
        .copied()
        .filter(|(name, _)| scripts.contains_key(*name))
        .collect()
}

/// Ask which scripts to run. Nothing runs unattended.
pub fn choose_scripts<P: Prompter>(
    available: &[(&'static str, &'static str)],
    skip_prompts: bool,
    prompter: &mut P,
) -> Result<Vec<&'static str>> {
    if skip_prompts || available.is_empty() {
        return Ok(Vec::new());
    }
    let options: Vec<SelectOption> = available
        .iter()
        .map(|(name, hint)| SelectOption::new(*name).hint(*hint))
        .collect();
    let chosen = prompter.multiselect("Run any of the template's scripts now?", &options, &[])?;
    Ok(chosen
        .into_iter()
        .filter_map(|idx| available.get(idx).map(|(name, _)| *name))
        .collect())
}

/// Run each script with `program run <name>`. A failure is reported and the
/// remaining scripts still run.
pub async fn run_chosen<P: Prompter>(
    program: &str,
    names: &[&str],
    project_dir: &Path,
    prompter: &mut P,
) -> ScriptsOutcome {
    let mut ran = Vec::new();
    let mut failed = Vec::new();
    for name in names {
        match runtime::run_streaming(program, &["run", name], project_dir).await {
            Ok(()) => ran.push(name.to_string()),
            Err(e) => {
                prompter.warn(&format!("Script '{}' failed: {:#}", name, e));
                failed.push(name.to_string());
            }
        }
    }
    if failed.is_empty() {
        ScriptsOutcome::Ran(ran)
    } else {
        ScriptsOutcome::Failed { ran, failed }
    }
}

pub async fn handle_scripts<P: Prompter>(
    project_dir: &Path,
    pm: PackageManager,
    skip_prompts: bool,
    prompter: &mut P,
) -> Result<ScriptsOutcome> {
    let scripts = read_scripts(project_dir)?;
    let available = available_scripts(&scripts);
    if available.is_empty() {
        return Ok(ScriptsOutcome::NoneAvailable);
    }

    let chosen = choose_scripts(&available, skip_prompts, prompter)?;
    if chosen.is_empty() {
        let names: Vec<&str> = available.iter().map(|(name, _)| *name).collect();
        prompter.info(&format!(
            "Template scripts not run: {}. Run them later with `{} run <script>`.",
            names.join(", "),
            pm
        ));
        return Ok(ScriptsOutcome::NoneChosen);
    }

    Ok(run_chosen(pm.binary(), &chosen, project_dir, prompter).await)
}
