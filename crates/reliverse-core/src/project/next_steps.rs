//! Closing guidance after a project is created

use crate::error::Result;
use crate::prompt::{Prompter, SelectOption};
use crate::runtime::{tool, PackageManager};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    OpenEditor,
    OpenDocs,
}

impl NextAction {
    pub const ALL: [NextAction; 2] = [NextAction::OpenEditor, NextAction::OpenDocs];

    pub fn label(&self) -> &'static str {
        match self {
            NextAction::OpenEditor => "Open the project in VS Code",
            NextAction::OpenDocs => "Open the documentation",
        }
    }
}

/// Lines printed after creation. `pending` names stages the user must
/// finish by hand.
pub fn guidance(
    project_dir: &Path,
    pm: PackageManager,
    deps_installed: bool,
    primary_domain: Option<&str>,
    pending: &[String],
) -> Vec<String> {
    let mut lines = vec![format!("cd {}", project_dir.display())];
    if !deps_installed {
        lines.push(format!("{} install", pm));
    }
    lines.push(format!("{} dev", pm.binary()));
    if let Some(domain) = primary_domain {
        lines.push(format!("Visit https://{}", domain));
    }
    for stage in pending {
        lines.push(format!("Finish manually: {}", stage));
    }
    lines
}

/// Print the guidance and offer follow-up actions
pub fn show_next_steps<P: Prompter>(
    project_dir: &Path,
    lines: &[String],
    docs_url: &str,
    skip_prompts: bool,
    prompter: &mut P,
) -> Result<Vec<NextAction>> {
    prompter.success("Project created");
    for line in lines {
        prompter.info(line);
    }
    if skip_prompts {
        return Ok(Vec::new());
    }

    let options: Vec<SelectOption> = NextAction::ALL
        .iter()
        .map(|a| SelectOption::new(a.label()))
        .collect();
    let chosen = prompter.multiselect("What would you like to do next?", &options, &[])?;
    let actions: Vec<NextAction> = chosen
        .into_iter()
        .filter_map(|i| NextAction::ALL.get(i).copied())
        .collect();

    for action in &actions {
        if let Err(e) = dispatch(*action, project_dir, docs_url) {
            prompter.warn(&format!("{}: {:#}", action.label(), e));
        }
    }
    Ok(actions)
}

fn dispatch(action: NextAction, project_dir: &Path, docs_url: &str) -> anyhow::Result<()> {
    match action {
        NextAction::OpenEditor => {
            if !tool::is_installed("code") {
                anyhow::bail!("the `code` command is not on PATH");
            }
            std::process::Command::new("code")
                .arg(project_dir)
                .spawn()
                .map(|_| ())
                .map_err(Into::into)
        }
        NextAction::OpenDocs => open::that(docs_url).map_err(Into::into),
    }
}
