//! Top-level flows: create a project, manage existing ones, list templates
//!
//! Every flow talks to the user through a [`Prompter`] and receives its
//! collaborators through a [`Toolkit`], so the same code runs behind the
//! cliclack TUI and under scripted tests.

use crate::config::{read_config, read_descriptor, update_descriptor, write_descriptor};
use crate::config::{Features, ReliverseConfig};
use crate::context::{DepsBehavior, RunContext, RunOptions};
use crate::deploy::git;
use crate::deploy::github;
use crate::deploy::vercel;
use crate::deploy::{self, DeployEnv, DeployOutcome, DeployService, PublishedRepo};
use crate::error::{Error, Result};
use crate::menu::{self, GitAction, MainAction, ProjectAction};
use crate::product::ProductConfig;
use crate::project::database::{self, DatabaseProvider};
use crate::project::deps::{self, DepsOutcome};
use crate::project::scripts::{self, ScriptsOutcome};
use crate::project::detect::{detect_projects, DetectedProject};
use crate::project::i18n::{self, I18nOutcome};
use crate::project::{env, initialize_project_config, next_steps, shadcn, ProjectConfig};
use crate::prompt::{Prompter, SelectOption};
use crate::runtime;
use crate::templates::replace::{self, ReplacementReport};
use crate::templates::{self, build_replacements};
use crate::templates::{
    Acquirer, ArchiveDownloader, Downloader, FreshnessSource, RepoInfoClient, TemplateCache,
    TemplateRegistry,
};
use crate::version;
use std::fmt;
use std::path::{Path, PathBuf};

/// Collaborators shared by the flows
pub struct Toolkit<F, D> {
    pub registry: TemplateRegistry,
    pub cache: TemplateCache,
    pub freshness: F,
    pub downloader: D,
    pub deploy: DeployEnv,
    pub docs_url: String,
}

impl Toolkit<RepoInfoClient, ArchiveDownloader> {
    /// Production collaborators for `product`
    pub fn from_product<C: ProductConfig>(product: &C, ctx: &RunContext) -> anyhow::Result<Self> {
        let deploy = DeployEnv::from_product(product, ctx, true)?;
        Ok(Self {
            registry: TemplateRegistry::builtin(),
            cache: TemplateCache::new(ctx.templates_dir()),
            freshness: RepoInfoClient::new(deploy.endpoints.repo_info.clone(), deploy.client.clone()),
            downloader: ArchiveDownloader::new(deploy.endpoints.archive.clone(), deploy.client.clone()),
            docs_url: product.docs_url().to_string(),
            deploy,
        })
    }
}

/// Stages that run after the template is materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Replace,
    I18n,
    Env,
    Dependencies,
    Scripts,
    Descriptor,
    Deploy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Replace => "placeholder replacement",
            Stage::I18n => "i18n setup",
            Stage::Env => ".env composition",
            Stage::Dependencies => "dependency installation",
            Stage::Scripts => "template scripts",
            Stage::Descriptor => ".reliverse descriptor",
            Stage::Deploy => "deployment",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Done,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
}

#[derive(Debug, Default)]
struct Stages(Vec<StageOutcome>);

impl Stages {
    fn push(&mut self, stage: Stage, status: StageStatus) {
        self.0.push(StageOutcome { stage, status });
    }

    fn done(&mut self, stage: Stage) {
        self.push(stage, StageStatus::Done);
    }

    fn skipped(&mut self, stage: Stage, reason: impl Into<String>) {
        self.push(stage, StageStatus::Skipped(reason.into()));
    }

    /// Record a failed stage and carry on. Cancellation is passed through.
    fn failed<P: Prompter>(&mut self, stage: Stage, err: Error, prompter: &mut P) -> Result<()> {
        if matches!(err, Error::Cancelled) {
            return Err(err);
        }
        let message = format!("{:#}", err);
        prompter.warn(&format!("{} failed: {}", stage, message));
        self.push(stage, StageStatus::Failed(message));
        Ok(())
    }
}

/// Template and name requested on the command line
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub template: Option<String>,
    pub name: Option<String>,
}

/// Everything the create flow did
#[derive(Debug, Clone)]
pub struct CreateReport {
    pub project: ProjectConfig,
    pub project_dir: PathBuf,
    pub template_id: String,
    pub used_local: bool,
    pub stages: Vec<StageOutcome>,
    pub deploy: DeployOutcome,
}

impl CreateReport {
    pub fn status(&self, stage: Stage) -> Option<&StageStatus> {
        self.stages.iter().find(|s| s.stage == stage).map(|s| &s.status)
    }

    /// Stages that were skipped or failed, for the closing guidance
    pub fn pending(&self) -> Vec<String> {
        self.stages
            .iter()
            .filter_map(|s| match &s.status {
                StageStatus::Done => None,
                StageStatus::Skipped(reason) => Some(format!("{} ({})", s.stage, reason)),
                StageStatus::Failed(_) => Some(format!("{} (failed)", s.stage)),
            })
            .collect()
    }
}

fn choose_template<P: Prompter>(
    registry: &TemplateRegistry,
    ctx: &RunContext,
    requested: Option<&str>,
    prompter: &mut P,
) -> Result<String> {
    if let Some(id) = requested {
        return Ok(id.to_string());
    }
    let templates = registry.templates();
    if ctx.options.skip_prompts {
        if let Some(id) = ctx
            .config
            .project_template
            .as_deref()
            .filter(|id| registry.find(id).is_ok())
        {
            return Ok(id.to_string());
        }
    }
    let first = templates
        .first()
        .ok_or_else(|| Error::Other(anyhow::anyhow!("No templates available")))?;
    if ctx.options.skip_prompts || templates.len() == 1 {
        prompter.info(&format!("Using template: {} - {}", first.id, first.description));
        return Ok(first.id.clone());
    }

    let options: Vec<SelectOption> = templates
        .iter()
        .map(|t| SelectOption::new(&t.id).hint(&t.description))
        .collect();
    let idx = prompter.select("Select a template", &options)?;
    Ok(templates.get(idx).unwrap_or(first).id.clone())
}

/// A finished walk is done even if some files failed; those are warned about.
/// A walk that never started is a failed stage.
fn record_replacement<P: Prompter>(
    stages: &mut Stages,
    report: &ReplacementReport,
    prompter: &mut P,
) -> Result<()> {
    for (path, e) in &report.failed {
        tracing::warn!("Could not update {}: {:#}", path.display(), e);
    }
    if !report.is_complete() {
        let message = match report.failed.first() {
            Some((path, e)) => format!("could not read {}: {:#}", path.display(), e),
            None => "directory walk did not finish".to_string(),
        };
        return stages.failed(Stage::Replace, Error::Other(anyhow::anyhow!(message)), prompter);
    }
    if !report.failed.is_empty() {
        prompter.warn(&format!(
            "{} of {} files could not be updated; placeholders may remain in them",
            report.failed.len(),
            report.files_seen()
        ));
    }
    stages.done(Stage::Replace);
    Ok(())
}

fn record_scripts(stages: &mut Stages, outcome: ScriptsOutcome) {
    match outcome {
        ScriptsOutcome::Ran(_) | ScriptsOutcome::NoneAvailable => stages.done(Stage::Scripts),
        ScriptsOutcome::NoneChosen => stages.skipped(Stage::Scripts, "none run"),
        ScriptsOutcome::Failed { failed, .. } => stages.push(
            Stage::Scripts,
            StageStatus::Failed(format!("{} failed", failed.join(", "))),
        ),
    }
}

/// Create a project from a template and run every post-materialization
/// stage. Only template acquisition failures and cancellation abort.
pub async fn create_project<F: FreshnessSource, D: Downloader, P: Prompter>(
    kit: &mut Toolkit<F, D>,
    ctx: &RunContext,
    request: &CreateRequest,
    prompter: &mut P,
) -> Result<CreateReport> {
    let skip_prompts = ctx.options.skip_prompts;
    let template_id = choose_template(&kit.registry, ctx, request.template.as_deref(), prompter)?;
    kit.registry.find(&template_id)?;

    let known_username = kit.deploy.memory.load().github_username;
    let project = initialize_project_config(
        ctx,
        known_username.as_deref(),
        request.name.as_deref(),
        prompter,
    )?;

    let acquisition = Acquirer {
        registry: &kit.registry,
        cache: &kit.cache,
        freshness: &kit.freshness,
        downloader: &kit.downloader,
    }
    .acquire(ctx, &template_id, &project.project_name, prompter)
    .await?;
    let dir = acquisition.project_dir.clone();
    let mut stages = Stages::default();

    let replaced = replace::apply(&dir, &build_replacements(&acquisition.template, &project)).await;
    record_replacement(&mut stages, &replaced, prompter)?;

    let enable_i18n = match ctx.config.i18n() {
        Some(enabled) => enabled,
        None if skip_prompts => false,
        None => prompter.confirm("Do you want to enable i18n (internationalization)?", false)?,
    };
    match i18n::setup_i18n(&dir, enable_i18n) {
        Ok(I18nOutcome::Enabled { moved }) => {
            prompter.success(&format!("i18n enabled, {} routes moved under [locale]", moved));
            stages.done(Stage::I18n);
        }
        Ok(I18nOutcome::AlreadyEnabled) => stages.done(Stage::I18n),
        Ok(I18nOutcome::Skipped) => stages.skipped(Stage::I18n, "not enabled"),
        Err(e) => stages.failed(Stage::I18n, e.into(), prompter)?,
    }

    let mask_secrets = skip_prompts || prompter.confirm("Do you want to mask secret inputs?", true)?;
    kit.deploy.mask_secrets = mask_secrets;

    match env::compose_env_file(
        &dir,
        &kit.deploy.endpoints.env_example,
        &kit.deploy.client,
        mask_secrets,
        skip_prompts,
        prompter,
    )
    .await
    {
        Ok(report) if report.missing.is_empty() => stages.done(Stage::Env),
        Ok(report) => stages.skipped(Stage::Env, format!("fill in {}", report.missing.join(", "))),
        Err(e) => stages.failed(Stage::Env, e, prompter)?,
    }

    let installed_with = match deps::handle_dependencies(ctx, &dir, prompter).await {
        Ok(DepsOutcome::Installed(pm)) => {
            stages.done(Stage::Dependencies);
            Some(pm)
        }
        Ok(DepsOutcome::Declined) => {
            stages.skipped(Stage::Dependencies, "not installed");
            None
        }
        Ok(DepsOutcome::Failed) => {
            stages.push(Stage::Dependencies, StageStatus::Failed("install failed".into()));
            None
        }
        Err(e) => {
            stages.failed(Stage::Dependencies, e, prompter)?;
            None
        }
    };
    let deps_installed = installed_with.is_some();

    match installed_with {
        Some(pm) => match scripts::handle_scripts(&dir, pm, skip_prompts, prompter).await {
            Ok(outcome) => record_scripts(&mut stages, outcome),
            Err(e) => stages.failed(Stage::Scripts, e, prompter)?,
        },
        None => stages.skipped(Stage::Scripts, "dependencies not installed"),
    }

    let descriptor = ReliverseConfig {
        project_name: Some(project.project_name.clone()),
        project_author: Some(project.frontend_username.clone()),
        project_template: Some(acquisition.template.id.clone()),
        project_domain: Some(project.domain.clone()),
        project_state: Some("created".into()),
        features: Some(Features {
            i18n: Some(enable_i18n),
        }),
        ..Default::default()
    };
    match write_descriptor(&dir, &descriptor) {
        Ok(_) => stages.done(Stage::Descriptor),
        Err(e) => stages.failed(Stage::Descriptor, e.into(), prompter)?,
    }

    let service = deploy::choose_deploy_service(ctx, prompter)?;
    let outcome = deploy::deploy_project(&kit.deploy, ctx, &project, &dir, service, prompter).await?;
    match (service, &outcome.deployment_url) {
        (DeployService::None, _) => stages.skipped(Stage::Deploy, "no deploy service chosen"),
        (_, Some(_)) => stages.done(Stage::Deploy),
        (_, None) => stages.push(Stage::Deploy, StageStatus::Failed("not deployed".into())),
    }

    let domain_changed = outcome.domain.as_ref().is_some_and(|d| *d != project.domain);
    if service != DeployService::None || domain_changed {
        let patch = ReliverseConfig {
            project_deploy_service: Some(service),
            project_domain: outcome.domain.clone().filter(|_| domain_changed),
            ..Default::default()
        };
        if let Err(e) = update_descriptor(&dir, &patch) {
            prompter.warn(&format!("Could not update .reliverse: {:#}", e));
        }
    }

    let report = CreateReport {
        project,
        project_dir: dir,
        template_id: acquisition.template.id.clone(),
        used_local: acquisition.used_local,
        stages: stages.0,
        deploy: outcome,
    };

    let pm = runtime::detect_package_manager(&report.project_dir);
    let lines = next_steps::guidance(
        &report.project_dir,
        pm,
        deps_installed,
        report.deploy.domain.as_deref(),
        &report.pending(),
    );
    next_steps::show_next_steps(&report.project_dir, &lines, &kit.docs_url, skip_prompts, prompter)?;

    Ok(report)
}

/// Pick a detected project and run project actions until the user exits
pub async fn manage_projects<F, D, P: Prompter>(
    kit: &Toolkit<F, D>,
    ctx: &RunContext,
    prompter: &mut P,
) -> Result<()> {
    let mut projects = detect_projects(&ctx.cwd).await;
    if projects.is_empty() {
        prompter.info(&format!("No Reliverse projects found in {}", ctx.cwd.display()));
        return Ok(());
    }
    let Some(idx) = menu::select_project(&projects, prompter)? else {
        return Ok(());
    };
    let project = &mut projects[idx];

    loop {
        let result = match menu::select_project_action(project, prompter)? {
            ProjectAction::GitDeploy => git_menu(&kit.deploy, ctx, project, prompter).await,
            ProjectAction::Database => database_menu(&project.path, prompter).await,
            ProjectAction::Components => components_menu(&project.path, prompter).await,
            ProjectAction::EditConfig => edit_config(project, prompter),
            ProjectAction::Exit => return Ok(()),
        };
        match result {
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => prompter.error(&format!("{:#}", e)),
            Ok(()) => {}
        }
        project.git = git::status(&project.path).await;
    }
}

async fn git_menu<P: Prompter>(
    env: &DeployEnv,
    ctx: &RunContext,
    project: &DetectedProject,
    prompter: &mut P,
) -> Result<()> {
    let dir = project.path.as_path();
    match menu::select_git_action(&project.git, prompter)? {
        GitAction::Init => {
            deploy::ensure_local_repo(dir, &env.commit_message, prompter).await;
        }
        GitAction::Commit => {
            let message = prompter.input("Enter commit message", "Update project")?;
            let message = match message.trim() {
                "" => "Update project",
                m => m,
            };
            if git::commit_all(dir, message).await? {
                prompter.success("Commit created");
            } else {
                prompter.info("Nothing to commit");
            }
        }
        GitAction::Push => {
            git::push(dir, "origin").await?;
            prompter.success("Commits pushed");
        }
        GitAction::CreateGithubRepo => {
            if let Some(repo) = deploy::publish_to_github(env, ctx, &project.name, dir, prompter).await? {
                prompter.success(&format!("Pushed to https://github.com/{}", repo.slug()));
            }
        }
        GitAction::Deploy => deploy_existing(env, ctx, project, prompter).await?,
        GitAction::Exit => {}
    }
    Ok(())
}

/// Deploy the GitHub repository behind `origin`, publishing it first when
/// the project has no GitHub remote
async fn deploy_existing<P: Prompter>(
    env: &DeployEnv,
    ctx: &RunContext,
    project: &DetectedProject,
    prompter: &mut P,
) -> Result<()> {
    let dir = project.path.as_path();
    let remote = git::remote_url(dir, "origin").await;
    let repo = match remote.as_deref().and_then(github::parse_remote) {
        Some((owner, name)) => PublishedRepo {
            owner,
            name,
            default_branch: None,
        },
        None => match deploy::publish_to_github(env, ctx, &project.name, dir, prompter).await? {
            Some(repo) => repo,
            None => return Ok(()),
        },
    };

    if let Some((_, domain)) = deploy::deploy_to_vercel(env, ctx, &repo, prompter).await? {
        let patch = ReliverseConfig {
            project_deploy_service: Some(DeployService::Vercel),
            project_domain: Some(domain),
            ..Default::default()
        };
        update_descriptor(dir, &patch)?;
    }
    Ok(())
}

async fn database_menu<P: Prompter>(dir: &Path, prompter: &mut P) -> Result<()> {
    let detected = database::detect_provider(dir);
    let sources = DatabaseProvider::SOURCES;
    let options: Vec<SelectOption> = sources
        .iter()
        .map(|p| {
            let hint = if detected == Some(*p) { "detected" } else { "" };
            SelectOption::new(p.label()).hint(hint)
        })
        .collect();
    let Some(from) = sources.get(prompter.select("Convert from:", &options)?).copied() else {
        return Ok(());
    };

    let targets = database::available_targets(from);
    let options: Vec<SelectOption> = targets.iter().map(|p| SelectOption::new(p.label())).collect();
    let Some(to) = targets.get(prompter.select("Convert to:", &options)?).copied() else {
        return Ok(());
    };

    let report = database::convert(dir, from, to).await?;
    prompter.success(&format!(
        "Converted {} to {}: {} files updated",
        from,
        to,
        report.rewritten.len()
    ));
    if !report.failed.is_empty() {
        prompter.warn(&format!("{} files could not be updated", report.failed.len()));
    }
    prompter.info("Column types and migrations are not converted. Review your schema.");
    Ok(())
}

async fn components_menu<P: Prompter>(dir: &Path, prompter: &mut P) -> Result<()> {
    let Some(config) = shadcn::read_config(dir)? else {
        prompter.error("shadcn/ui configuration not found");
        return Ok(());
    };
    let installed = shadcn::installed_components(dir, &config);

    let options = [
        SelectOption::new("Add components"),
        SelectOption::new("Remove components"),
        SelectOption::new("Update components"),
    ];
    let action = prompter.select("What would you like to do?", &options)?;

    let candidates: Vec<String> = if action == 0 {
        shadcn::addable_components(&installed)
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        installed
    };
    if candidates.is_empty() {
        prompter.info("No components to choose from");
        return Ok(());
    }

    let verb = match action {
        0 => "add",
        1 => "remove",
        _ => "update",
    };
    let options: Vec<SelectOption> = candidates.iter().map(SelectOption::new).collect();
    let chosen: Vec<String> = prompter
        .multiselect(&format!("Select components to {}:", verb), &options, &[])?
        .into_iter()
        .filter_map(|i| candidates.get(i).cloned())
        .collect();
    if chosen.is_empty() {
        prompter.info("No components selected");
        return Ok(());
    }

    match action {
        0 => shadcn::add_components(dir, &chosen).await?,
        1 => {
            let removed = shadcn::remove_components(dir, &config, &chosen)?;
            prompter.success(&format!("Removed {}", removed.join(", ")));
        }
        _ => shadcn::update_components(dir, &chosen).await?,
    }
    Ok(())
}

fn edit_config<P: Prompter>(project: &mut DetectedProject, prompter: &mut P) -> Result<()> {
    let current = &project.config;
    let domain_default = current
        .project_domain
        .clone()
        .unwrap_or_else(|| vercel::default_domain(&project.name));
    let domain = prompter.input("Project domain", &domain_default)?;
    let author = prompter.input(
        "Project author",
        current.project_author.as_deref().unwrap_or_default(),
    )?;
    let services: Vec<SelectOption> = DeployService::ALL
        .iter()
        .map(|s| SelectOption::new(s.label()))
        .collect();
    let service = DeployService::ALL
        .get(prompter.select("Deploy service", &services)?)
        .copied()
        .unwrap_or_default();

    let domain = match domain.trim() {
        "" => domain_default,
        d => d.to_string(),
    };
    let author = author.trim().to_string();
    let patch = ReliverseConfig {
        project_domain: Some(domain),
        project_author: (!author.is_empty()).then_some(author),
        project_deploy_service: Some(service),
        ..Default::default()
    };
    update_descriptor(&project.path, &patch)?;
    project.config = read_descriptor(&project.path)?.unwrap_or_default();
    prompter.success("Configuration updated");
    Ok(())
}

/// Print the registry with what the local cache holds
pub async fn list_templates<F, D, P: Prompter>(kit: &Toolkit<F, D>, prompter: &mut P) {
    for listing in templates::list_with_cache_status(&kit.registry, &kit.cache).await {
        let status = match (listing.cached, listing.cached_at) {
            (true, Some(at)) => format!("cached {}", at.format("%Y-%m-%d")),
            (true, None) => "cached".to_string(),
            (false, _) => "not cached".to_string(),
        };
        prompter.info(&format!(
            "{} - {} ({})",
            listing.template.id, listing.template.description, status
        ));
    }
}

/// Warn when the running CLI is a beta, a `next` build or outdated
pub async fn check_for_updates<F, D, P: Prompter>(
    kit: &Toolkit<F, D>,
    package: &str,
    upgrade_command: &str,
    current: &str,
    prompter: &mut P,
) {
    let latest =
        version::fetch_latest(&kit.deploy.client, &kit.deploy.endpoints.npm_registry, package)
            .await;
    if let Some(warning) = version::check_version(current, latest.as_deref()) {
        prompter.warn(&warning.message(package, upgrade_command));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Create,
    Manage,
    Templates,
}

/// Command-line input, validated by the binary
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// `None` shows the main menu
    pub command: Option<Command>,
    pub yes: bool,
    pub dev: bool,
    pub deps: Option<DepsBehavior>,
    pub template: Option<String>,
    pub name: Option<String>,
}

/// Resolve options, check for updates and dispatch the requested flow
pub async fn run_with<C: ProductConfig, P: Prompter>(
    product: &C,
    args: RunArgs,
    cli_version: &str,
    cwd: PathBuf,
    home: PathBuf,
    prompter: &mut P,
) -> Result<()> {
    let config = read_config(&cwd);
    let options = RunOptions::resolve(args.yes, args.dev, args.deps, &config);
    let ctx = RunContext::new(cwd, home, product.home_dir_name(), options, config);
    let mut kit = Toolkit::from_product(product, &ctx)?;

    check_for_updates(
        &kit,
        product.npm_package(),
        &product.upgrade_command(),
        cli_version,
        prompter,
    )
    .await;

    let command = match args.command {
        Some(command) => command,
        None if ctx.options.skip_prompts => Command::Create,
        None => {
            let detected = detect_projects(&ctx.cwd).await.len();
            match menu::select_main_action(detected, prompter)? {
                MainAction::Create => Command::Create,
                MainAction::Manage => Command::Manage,
                MainAction::Exit => return Ok(()),
            }
        }
    };

    match command {
        Command::Create => {
            let request = CreateRequest {
                template: args.template,
                name: args.name,
            };
            let report = create_project(&mut kit, &ctx, &request, prompter).await?;
            tracing::debug!("Created {} with stages {:?}", report.project_dir.display(), report.stages);
        }
        Command::Manage => manage_projects(&kit, &ctx, prompter).await?,
        Command::Templates => list_templates(&kit, prompter).await,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::http;
    use crate::product::Endpoints;
    use crate::prompt::testing::{Answer, ScriptedPrompter};
    use crate::templates::acquire::tests::{StubDownloader, StubFreshness};
    use crate::templates::Template;
    use tempfile::TempDir;
    use url::Url;

    fn deploy_env(home: &Path) -> DeployEnv {
        let unused = Url::parse("http://127.0.0.1:9").unwrap();
        DeployEnv {
            endpoints: Endpoints {
                repo_info: unused.clone(),
                archive: unused.clone(),
                npm_registry: unused.clone(),
                github_api: unused.clone(),
                vercel_api: unused.clone(),
                env_example: unused,
            },
            client: http::client("create-reliverse-test"),
            memory: MemoryStore::new(&home.join(".reliverse")),
            github_token_env: "RELIVERSE_TEST_GITHUB_TOKEN_NEVER_SET",
            vercel_token_env: "RELIVERSE_TEST_VERCEL_TOKEN_NEVER_SET",
            mask_secrets: true,
            commit_message: "Initial commit".into(),
        }
    }

    fn kit(home: &Path) -> Toolkit<StubFreshness, StubDownloader> {
        Toolkit {
            registry: TemplateRegistry::from_templates(vec![
                Template::new("acme/tpl", "Test template").unwrap()
            ]),
            cache: TemplateCache::new(home.join(".reliverse/templates")),
            freshness: StubFreshness(None),
            downloader: StubDownloader {
                files: vec![
                    ("README.md", "# tpl by acme"),
                    (".env.example", "AUTH_SECRET=\nAPP_NAME=tpl\n"),
                    ("src/app/page.tsx", "export default function Page() {}"),
                ],
                ..Default::default()
            },
            deploy: deploy_env(home),
            docs_url: "https://docs.reliverse.org".into(),
        }
    }

    fn ctx(work: &Path, home: &Path, skip_prompts: bool) -> RunContext {
        RunContext::new(
            work,
            home,
            ".reliverse",
            RunOptions {
                skip_prompts,
                deps_behavior: DepsBehavior::AutoNo,
                ..Default::default()
            },
            ReliverseConfig::default(),
        )
    }

    fn shop_request() -> CreateRequest {
        CreateRequest {
            template: None,
            name: Some("shop".into()),
        }
    }

    #[tokio::test]
    async fn test_unattended_create_runs_every_stage_without_prompts() {
        let work = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let mut kit = kit(home.path());
        let mut prompter = ScriptedPrompter::default();

        let report = create_project(
            &mut kit,
            &ctx(work.path(), home.path(), true),
            &shop_request(),
            &mut prompter,
        )
        .await
        .unwrap();

        assert!(prompter.asked.is_empty());
        let dir = work.path().join("shop");
        assert_eq!(report.project_dir, dir);
        assert_eq!(
            std::fs::read_to_string(dir.join("README.md")).unwrap(),
            "# shop by reliverse-user"
        );
        let env = std::fs::read_to_string(dir.join(".env")).unwrap();
        assert!(env.contains("APP_NAME=\"shop\""));

        let descriptor = read_descriptor(&dir).unwrap().unwrap();
        assert_eq!(descriptor.project_name.as_deref(), Some("shop"));
        assert_eq!(descriptor.project_template.as_deref(), Some("acme/tpl"));
        assert_eq!(descriptor.i18n(), Some(false));

        assert_eq!(report.status(Stage::Replace), Some(&StageStatus::Done));
        assert_eq!(report.status(Stage::Descriptor), Some(&StageStatus::Done));
        assert!(matches!(report.status(Stage::I18n), Some(StageStatus::Skipped(_))));
        assert!(matches!(report.status(Stage::Env), Some(StageStatus::Skipped(_))));
        assert!(matches!(report.status(Stage::Dependencies), Some(StageStatus::Skipped(_))));
        assert_eq!(
            report.status(Stage::Scripts),
            Some(&StageStatus::Skipped("dependencies not installed".into()))
        );
        assert!(matches!(report.status(Stage::Deploy), Some(StageStatus::Skipped(_))));
        assert!(report.pending().iter().any(|p| p.contains("AUTH_SECRET")));
        // Unattended downloads are kept for next time
        assert!(kit.cache.exists(kit.registry.find("acme/tpl").unwrap()).await);
    }

    #[tokio::test]
    async fn test_interactive_create_asks_in_stage_order() {
        let work = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let mut kit = kit(home.path());
        let mut prompter = ScriptedPrompter::new([
            Answer::Text("alice".into()),
            Answer::Text("".into()),
            Answer::Confirm(false),
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Text("s3cr3t".into()),
            Answer::Select(1),
            Answer::Multi(vec![]),
        ]);

        let report = create_project(
            &mut kit,
            &ctx(work.path(), home.path(), false),
            &shop_request(),
            &mut prompter,
        )
        .await
        .unwrap();

        assert!(prompter.was_asked("Save a copy"));
        assert!(prompter.was_asked("i18n"));
        assert!(prompter.was_asked("mask secret"));
        assert!(prompter.was_asked("AUTH_SECRET"));
        assert_eq!(report.project.domain, "shop.vercel.app");
        assert_eq!(report.status(Stage::I18n), Some(&StageStatus::Done));
        assert_eq!(report.status(Stage::Env), Some(&StageStatus::Done));

        let dir = work.path().join("shop");
        assert!(dir.join("src/app/[locale]/page.tsx").exists());
        let descriptor = read_descriptor(&dir).unwrap().unwrap();
        assert_eq!(descriptor.project_author.as_deref(), Some("alice"));
        assert_eq!(descriptor.i18n(), Some(true));
        assert!(!kit.cache.exists(kit.registry.find("acme/tpl").unwrap()).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_partial_replacement_is_done_with_warning() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("README.md"), "acme").unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", dir.path().join("broken")).unwrap();
        let report = replace::apply(dir.path(), &templates::ReplacementMap::from_iter([("acme", "alice")])).await;
        let mut stages = Stages::default();
        let mut prompter = ScriptedPrompter::default();

        record_replacement(&mut stages, &report, &mut prompter).unwrap();

        assert_eq!(stages.0[0].status, StageStatus::Done);
        assert!(prompter.logged("1 of 2 files could not be updated"));
        assert_eq!(std::fs::read_to_string(dir.path().join("README.md")).unwrap(), "alice");
    }

    #[test]
    fn test_script_outcomes_map_to_stage_status() {
        let mut stages = Stages::default();
        record_scripts(&mut stages, ScriptsOutcome::Ran(vec!["check".into()]));
        record_scripts(&mut stages, ScriptsOutcome::NoneChosen);
        record_scripts(
            &mut stages,
            ScriptsOutcome::Failed {
                ran: vec!["db:push".into()],
                failed: vec!["check".into()],
            },
        );

        let statuses: Vec<_> = stages.0.iter().map(|s| s.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![
                StageStatus::Done,
                StageStatus::Skipped("none run".into()),
                StageStatus::Failed("check failed".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreadable_project_fails_replacement() {
        let dir = TempDir::new().unwrap();
        let report = replace::apply(
            &dir.path().join("gone"),
            &templates::ReplacementMap::from_iter([("acme", "alice")]),
        )
        .await;
        let mut stages = Stages::default();
        let mut prompter = ScriptedPrompter::default();

        record_replacement(&mut stages, &report, &mut prompter).unwrap();

        assert!(matches!(stages.0[0].status, StageStatus::Failed(_)));
        assert!(prompter.logged("placeholder replacement failed"));
    }

    #[tokio::test]
    async fn test_unknown_template_aborts_before_prompts() {
        let work = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let mut kit = kit(home.path());
        let mut prompter = ScriptedPrompter::default();
        let request = CreateRequest {
            template: Some("acme/missing".into()),
            name: Some("shop".into()),
        };

        let err = create_project(&mut kit, &ctx(work.path(), home.path(), true), &request, &mut prompter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TemplateNotFound(_)));
        assert!(!work.path().join("shop").exists());
    }

    #[test]
    fn test_unattended_template_comes_from_defaults() {
        let work = TempDir::new().unwrap();
        let registry = TemplateRegistry::builtin();
        let mut ctx = ctx(work.path(), work.path(), true);
        ctx.config.project_template = Some("blefnk/next-react-ts-src-minimal".into());
        let mut prompter = ScriptedPrompter::default();

        let id = choose_template(&registry, &ctx, None, &mut prompter).unwrap();
        assert_eq!(id, "blefnk/next-react-ts-src-minimal");

        ctx.config.project_template = Some("someone/else".into());
        let id = choose_template(&registry, &ctx, None, &mut prompter).unwrap();
        assert_eq!(id, registry.templates()[0].id);
    }

    #[tokio::test]
    async fn test_manage_without_projects() {
        let work = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let mut prompter = ScriptedPrompter::default();

        manage_projects(&kit(home.path()), &ctx(work.path(), home.path(), false), &mut prompter)
            .await
            .unwrap();
        assert!(prompter.logged("No Reliverse projects found"));
    }

    #[tokio::test]
    async fn test_manage_edit_config_merges_descriptor() {
        let work = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let dir = work.path().join("shop");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(".reliverse"),
            r#"{ "projectName": "shop", "customKey": 1 }"#,
        )
        .unwrap();

        let mut prompter = ScriptedPrompter::new([
            Answer::Select(0),
            Answer::Select(3),
            Answer::Text("shop.dev".into()),
            Answer::Text("bob".into()),
            Answer::Select(0),
            Answer::Select(4),
        ]);
        manage_projects(&kit(home.path()), &ctx(work.path(), home.path(), false), &mut prompter)
            .await
            .unwrap();

        let descriptor = read_descriptor(&dir).unwrap().unwrap();
        assert_eq!(descriptor.project_name.as_deref(), Some("shop"));
        assert_eq!(descriptor.project_domain.as_deref(), Some("shop.dev"));
        assert_eq!(descriptor.project_author.as_deref(), Some("bob"));
        assert_eq!(descriptor.project_deploy_service, Some(DeployService::Vercel));
        assert_eq!(descriptor.extra.get("customKey"), Some(&serde_json::json!(1)));
        assert!(prompter.logged("Configuration updated"));
    }

    #[tokio::test]
    async fn test_database_menu_converts_detected_provider() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("drizzle.config.ts"),
            "export default { dialect: \"postgresql\" };",
        )
        .unwrap();
        let mut prompter = ScriptedPrompter::new([Answer::Select(0), Answer::Select(0)]);

        database_menu(dir.path(), &mut prompter).await.unwrap();

        assert_eq!(database::detect_provider(dir.path()), Some(DatabaseProvider::Mysql));
        assert!(prompter.logged("1 files updated"));
    }

    #[tokio::test]
    async fn test_components_menu_requires_shadcn_config() {
        let dir = TempDir::new().unwrap();
        let mut prompter = ScriptedPrompter::default();
        components_menu(dir.path(), &mut prompter).await.unwrap();
        assert!(prompter.logged("shadcn/ui configuration not found"));
    }

    #[tokio::test]
    async fn test_components_menu_removes_selected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("components.json"), "{}").unwrap();
        let ui = dir.path().join("src/components/ui");
        std::fs::create_dir_all(&ui).unwrap();
        std::fs::write(ui.join("button.tsx"), "").unwrap();
        std::fs::write(ui.join("card.tsx"), "").unwrap();

        let mut prompter = ScriptedPrompter::new([Answer::Select(1), Answer::Multi(vec![1])]);
        components_menu(dir.path(), &mut prompter).await.unwrap();

        assert!(ui.join("button.tsx").exists());
        assert!(!ui.join("card.tsx").exists());
        assert!(prompter.logged("Removed card"));
    }

    #[tokio::test]
    async fn test_list_templates_reports_cache_status() {
        let home = TempDir::new().unwrap();
        let mut prompter = ScriptedPrompter::default();
        list_templates(&kit(home.path()), &mut prompter).await;
        assert!(prompter.logged("acme/tpl - Test template (not cached)"));
    }
}
