//! Project identity and the post-materialization stages
//!
//! Submodules cover the stages that run after a template has been copied
//! into place (i18n layout, environment file, dependencies, template
//! scripts, next steps) and
//! the operations offered for projects that already exist (detection,
//! database conversion, UI components).

pub mod database;
pub mod deps;
pub mod detect;
pub mod env;
pub mod i18n;
pub mod next_steps;
pub mod scripts;
pub mod shadcn;

use crate::context::RunContext;
use crate::deploy::vercel::default_domain;
use crate::error::Result;
use crate::prompt::Prompter;
use std::path::Path;

const DEFAULT_USERNAME: &str = "reliverse-user";
const DEFAULT_PROJECT_NAME: &str = "my-reliverse-app";

/// Answers that drive placeholder replacement, fixed once collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub frontend_username: String,
    pub project_name: String,
    pub domain: String,
}

/// Lowercase letters, digits, `-`, `_` and `.`, not starting with a separator
pub fn is_valid_project_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
}

/// Collect username, project name and domain.
///
/// Unattended runs take values from `.reliverse` defaults, then the given
/// fallbacks. Interactive runs prompt, pre-filling the same values.
/// `preset_name` (from the command line) skips the name prompt.
pub fn initialize_project_config<P: Prompter>(
    ctx: &RunContext,
    known_username: Option<&str>,
    preset_name: Option<&str>,
    prompter: &mut P,
) -> Result<ProjectConfig> {
    let config = &ctx.config;
    let username_default = config
        .project_author
        .as_deref()
        .or(known_username)
        .unwrap_or(DEFAULT_USERNAME)
        .to_string();
    let name_default = preset_name
        .map(str::to_string)
        .or_else(|| {
            config.project_template.as_deref().map(|t| {
                Path::new(t)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| t.to_string())
            })
        })
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());

    if ctx.options.skip_prompts {
        let project_name = if is_valid_project_name(&name_default) {
            name_default
        } else {
            prompter.warn(&format!(
                "'{}' is not a valid project name, using {}",
                name_default, DEFAULT_PROJECT_NAME
            ));
            DEFAULT_PROJECT_NAME.to_string()
        };
        let domain = config
            .project_domain
            .clone()
            .unwrap_or_else(|| default_domain(&project_name));
        return Ok(ProjectConfig {
            frontend_username: username_default,
            project_name,
            domain,
        });
    }

    let frontend_username = loop {
        let answer = prompter.input("What's your username?", &username_default)?;
        let answer = answer.trim();
        if answer.is_empty() {
            break username_default.clone();
        }
        if answer.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            break answer.to_string();
        }
        prompter.warn("Please use only letters, numbers and hyphens.");
    };

    let project_name = match preset_name.filter(|n| is_valid_project_name(n)) {
        Some(name) => name.to_string(),
        None => loop {
            let answer = prompter.input("How should I name your project?", &name_default)?;
            let answer = answer.trim();
            let candidate = if answer.is_empty() { name_default.as_str() } else { answer };
            if is_valid_project_name(candidate) {
                break candidate.to_string();
            }
            prompter.warn(
                "Project name can only contain lowercase letters, numbers, hyphens, underscores and dots.",
            );
        },
    };

    let domain_default = config
        .project_domain
        .clone()
        .unwrap_or_else(|| default_domain(&project_name));
    let domain = prompter.input("Enter your project's domain", &domain_default)?;
    let domain = match domain.trim() {
        "" => domain_default,
        d => d.to_string(),
    };

    Ok(ProjectConfig {
        frontend_username,
        project_name,
        domain,
    })
}
