//! Per-invocation run context
//!
//! Everything a flow needs to know about "where" and "how" it runs lives here
//! and is passed down explicitly.

use crate::config::ReliverseConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How dependency installation is decided after a project is materialized
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum DepsBehavior {
    /// Always install without asking
    AutoYes,
    /// Never install
    AutoNo,
    /// Ask the user
    #[default]
    Prompt,
}

/// Options recognized by the pipeline, validated once at the CLI boundary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Unattended mode: never prompt, use fixed default decisions
    pub skip_prompts: bool,
    /// Dev mode: projects are created under `tests-runtime/`
    pub is_dev: bool,
    pub deps_behavior: DepsBehavior,
}

impl RunOptions {
    /// Merge CLI flags with the user's `.reliverse` defaults. Explicit flags win.
    pub fn resolve(
        yes: bool,
        dev: bool,
        deps: Option<DepsBehavior>,
        config: &ReliverseConfig,
    ) -> Self {
        Self {
            skip_prompts: yes || config.skip_prompts_use_auto_behavior.unwrap_or(false),
            is_dev: dev,
            deps_behavior: deps.or(config.deps_behavior).unwrap_or_default(),
        }
    }
}

/// Context threaded through every stage of one top-level flow
#[derive(Debug, Clone)]
pub struct RunContext {
    pub cwd: PathBuf,
    pub home: PathBuf,
    pub options: RunOptions,
    /// Defaults read from `<cwd>/.reliverse`, empty when absent
    pub config: ReliverseConfig,
    home_dir_name: String,
}

impl RunContext {
    pub fn new(
        cwd: impl Into<PathBuf>,
        home: impl Into<PathBuf>,
        home_dir_name: &str,
        options: RunOptions,
        config: ReliverseConfig,
    ) -> Self {
        Self {
            cwd: cwd.into(),
            home: home.into(),
            options,
            config,
            home_dir_name: home_dir_name.to_string(),
        }
    }

    /// Per-user data directory, e.g. `~/.reliverse`
    pub fn data_dir(&self) -> PathBuf {
        self.home.join(&self.home_dir_name)
    }

    /// Root of the local template cache
    pub fn templates_dir(&self) -> PathBuf {
        self.data_dir().join("templates")
    }

    /// Directory a new project named `project_name` is materialized into
    pub fn project_dir(&self, project_name: &str) -> PathBuf {
        project_dir_in(&self.cwd, self.options.is_dev, project_name)
    }
}

fn project_dir_in(cwd: &Path, is_dev: bool, project_name: &str) -> PathBuf {
    if is_dev {
        cwd.join("tests-runtime").join(project_name)
    } else {
        cwd.join(project_name)
    }
}
