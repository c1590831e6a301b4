//! Closed menus and the rules deciding which entries are offered

use crate::deploy::git::GitStatus;
use crate::error::Result;
use crate::project::detect::DetectedProject;
use crate::prompt::{Prompter, SelectOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainAction {
    Create,
    Manage,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    GitDeploy,
    Database,
    Components,
    EditConfig,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitAction {
    Init,
    Commit,
    Push,
    CreateGithubRepo,
    Deploy,
    Exit,
}

impl GitAction {
    pub fn label(&self) -> &'static str {
        match self {
            GitAction::Init => "Initialize git repository",
            GitAction::Commit => "Create commit",
            GitAction::Push => "Push commits",
            GitAction::CreateGithubRepo => "Create GitHub repository",
            GitAction::Deploy => "Deploy to Vercel",
            GitAction::Exit => "Exit",
        }
    }
}

/// Git actions that make sense for a working tree in `status`
pub fn available_git_actions(status: &GitStatus) -> Vec<GitAction> {
    let mut actions = Vec::new();
    if !status.is_repo {
        actions.push(GitAction::Init);
        actions.push(GitAction::Exit);
        return actions;
    }
    if status.uncommitted > 0 {
        actions.push(GitAction::Commit);
    }
    if status.has_remote && status.unpushed > 0 {
        actions.push(GitAction::Push);
    }
    if !status.has_remote && status.has_commits {
        actions.push(GitAction::CreateGithubRepo);
    }
    if status.has_commits {
        actions.push(GitAction::Deploy);
    }
    actions.push(GitAction::Exit);
    actions
}

fn git_action_hint(action: GitAction, status: &GitStatus) -> String {
    match action {
        GitAction::Commit => format!("{} uncommitted changes", status.uncommitted),
        GitAction::Push => format!("{} unpushed commits", status.unpushed),
        GitAction::Deploy if !status.has_remote => "creates a GitHub repository first".into(),
        _ => String::new(),
    }
}

/// Project actions with the reason an action is unavailable, if any
pub fn project_actions(project: &DetectedProject) -> Vec<(ProjectAction, Option<&'static str>)> {
    let needs_install = project
        .needs_deps_install
        .then_some("install dependencies first");
    vec![
        (ProjectAction::GitDeploy, None),
        (ProjectAction::Database, needs_install),
        (ProjectAction::Components, needs_install),
        (ProjectAction::EditConfig, None),
        (ProjectAction::Exit, None),
    ]
}

pub fn select_main_action<P: Prompter>(detected: usize, prompter: &mut P) -> Result<MainAction> {
    let mut actions = vec![(
        MainAction::Create,
        SelectOption::new("Create a new project").hint("Start from a template"),
    )];
    if detected > 0 {
        actions.push((
            MainAction::Manage,
            SelectOption::new("Manage an existing project")
                .hint(format!("{} detected", detected)),
        ));
    }
    actions.push((MainAction::Exit, SelectOption::new("Exit")));

    let options: Vec<SelectOption> = actions.iter().map(|(_, o)| o.clone()).collect();
    let idx = prompter.select("What would you like to do?", &options)?;
    Ok(actions.get(idx).map(|(a, _)| *a).unwrap_or(MainAction::Exit))
}

pub fn select_project<P: Prompter>(
    projects: &[DetectedProject],
    prompter: &mut P,
) -> Result<Option<usize>> {
    let mut options: Vec<SelectOption> = projects
        .iter()
        .map(|p| SelectOption::new(&p.name).hint(p.hint()))
        .collect();
    options.push(SelectOption::new("Exit"));
    let idx = prompter.select("Select a project to manage", &options)?;
    Ok((idx < projects.len()).then_some(idx))
}

/// Unavailable actions are shown with their reason and answer as `Exit`
pub fn select_project_action<P: Prompter>(
    project: &DetectedProject,
    prompter: &mut P,
) -> Result<ProjectAction> {
    let actions = project_actions(project);
    let options: Vec<SelectOption> = actions
        .iter()
        .map(|(action, disabled)| {
            let (label, hint) = match action {
                ProjectAction::GitDeploy => ("Git & Deploy", "Commit, push and deploy"),
                ProjectAction::Database => ("Database", "Convert between database providers"),
                ProjectAction::Components => ("UI components", "Manage shadcn/ui components"),
                ProjectAction::EditConfig => ("Edit configuration", "Domain, author and deploy service"),
                ProjectAction::Exit => ("Exit", ""),
            };
            SelectOption::new(label).hint(disabled.unwrap_or(hint))
        })
        .collect();

    let idx = prompter.select(&format!("What would you like to do with {}?", project.name), &options)?;
    match actions.get(idx) {
        Some((action, None)) => Ok(*action),
        Some((_, Some(reason))) => {
            prompter.warn(&format!("Not available: {}", reason));
            Ok(ProjectAction::Exit)
        }
        None => Ok(ProjectAction::Exit),
    }
}

pub fn select_git_action<P: Prompter>(status: &GitStatus, prompter: &mut P) -> Result<GitAction> {
    let actions = available_git_actions(status);
    let options: Vec<SelectOption> = actions
        .iter()
        .map(|a| SelectOption::new(a.label()).hint(git_action_hint(*a, status)))
        .collect();
    let idx = prompter.select("Git & Deploy", &options)?;
    Ok(actions.get(idx).copied().unwrap_or(GitAction::Exit))
}
