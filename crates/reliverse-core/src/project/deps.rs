//! Dependency installation decision

use crate::context::{DepsBehavior, RunContext};
use crate::error::Result;
use crate::prompt::Prompter;
use crate::runtime::{self, PackageManager};
use std::path::Path;

const INSTALL_PROMPT: &str =
    "Would you like me to install dependencies for you? It's highly recommended, but may take some time.";

/// Outcome of the dependencies stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsOutcome {
    Installed(PackageManager),
    Declined,
    /// Installation was attempted and failed
    Failed,
}

/// `AutoYes` installs, `AutoNo` skips. `Prompt` asks, or installs when
/// running unattended.
pub fn should_install_deps<P: Prompter>(
    behavior: DepsBehavior,
    skip_prompts: bool,
    prompter: &mut P,
) -> Result<bool> {
    match behavior {
        DepsBehavior::AutoYes => Ok(true),
        DepsBehavior::AutoNo => Ok(false),
        DepsBehavior::Prompt if skip_prompts => Ok(true),
        DepsBehavior::Prompt => prompter.confirm(INSTALL_PROMPT, true),
    }
}

pub async fn handle_dependencies<P: Prompter>(
    ctx: &RunContext,
    project_dir: &Path,
    prompter: &mut P,
) -> Result<DepsOutcome> {
    if !should_install_deps(ctx.options.deps_behavior, ctx.options.skip_prompts, prompter)? {
        let pm = runtime::detect_package_manager(project_dir);
        prompter.info(&format!("Skipped installing dependencies. Run `{} install` later.", pm));
        return Ok(DepsOutcome::Declined);
    }

    match runtime::install_dependencies(project_dir).await {
        Ok(pm) => {
            prompter.success(&format!("Dependencies installed with {}", pm));
            Ok(DepsOutcome::Installed(pm))
        }
        Err(e) => {
            prompter.warn(&format!("Failed to install dependencies: {:#}", e));
            Ok(DepsOutcome::Failed)
        }
    }
}
