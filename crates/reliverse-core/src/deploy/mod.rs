//! Git, GitHub and Vercel hand-off for a materialized project
//!
//! The deployment stage runs local git first, then GitHub, then Vercel.
//! Every step after local git is optional: a missing token or a failed call
//! ends the stage with whatever was achieved so far.

pub mod git;
pub mod github;
pub mod vercel;

use crate::config::{resolve_token, MemoryStore, RepoPrivacy};
use crate::context::RunContext;
use crate::error::Result;
use crate::http;
use crate::product::{Endpoints, ProductConfig};
use crate::project::ProjectConfig;
use crate::prompt::{Prompter, SelectOption};
use github::GithubClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use vercel::VercelClient;

/// Where a project is deployed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployService {
    Vercel,
    #[default]
    None,
}

impl DeployService {
    pub const ALL: [DeployService; 2] = [DeployService::Vercel, DeployService::None];

    pub fn label(&self) -> &'static str {
        match self {
            DeployService::Vercel => "Vercel",
            DeployService::None => "Skip deployment",
        }
    }
}

impl fmt::Display for DeployService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployService::Vercel => write!(f, "vercel"),
            DeployService::None => write!(f, "none"),
        }
    }
}

/// Services and credentials the deployment stage talks to
pub struct DeployEnv {
    pub endpoints: Endpoints,
    pub client: reqwest::Client,
    pub memory: MemoryStore,
    pub github_token_env: &'static str,
    pub vercel_token_env: &'static str,
    /// Hide token input on screen
    pub mask_secrets: bool,
    /// Message of the first commit made by the CLI
    pub commit_message: String,
}

impl DeployEnv {
    pub fn from_product<C: ProductConfig>(
        product: &C,
        ctx: &RunContext,
        mask_secrets: bool,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            endpoints: product.endpoints()?,
            client: http::client(product.user_agent()),
            memory: MemoryStore::new(&ctx.data_dir()),
            github_token_env: product.github_token_env(),
            vercel_token_env: product.vercel_token_env(),
            mask_secrets,
            commit_message: format!("Initial commit by {}", product.name()),
        })
    }
}

/// What the deployment stage achieved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployOutcome {
    pub service: DeployService,
    pub git_initialized: bool,
    /// `owner/name` of the GitHub repository the project was pushed to
    pub repo: Option<String>,
    pub deployment_url: Option<String>,
    /// Primary production domain
    pub domain: Option<String>,
}

/// Ask where to deploy. Unattended runs use the configured service, or none.
pub fn choose_deploy_service<P: Prompter>(
    ctx: &RunContext,
    prompter: &mut P,
) -> Result<DeployService> {
    if ctx.options.skip_prompts {
        return Ok(ctx.config.project_deploy_service.unwrap_or_default());
    }
    let options: Vec<SelectOption> = DeployService::ALL
        .iter()
        .map(|s| SelectOption::new(s.label()))
        .collect();
    let idx = prompter.select("Where do you want to deploy your project?", &options)?;
    Ok(DeployService::ALL.get(idx).copied().unwrap_or_default())
}

#[derive(Clone, Copy)]
enum TokenKind {
    Github,
    Vercel,
}

fn ensure_token<P: Prompter>(
    env: &DeployEnv,
    ctx: &RunContext,
    kind: TokenKind,
    prompter: &mut P,
) -> Result<Option<String>> {
    let memory = env.memory.load();
    let (var, stored, prompt) = match kind {
        TokenKind::Github => (
            env.github_token_env,
            memory.github_key.as_deref(),
            "Enter your GitHub personal access token (needs the 'repo' scope)",
        ),
        TokenKind::Vercel => (
            env.vercel_token_env,
            memory.vercel_key.as_deref(),
            "Enter your Vercel access token",
        ),
    };

    if let Some(token) = resolve_token(var, stored) {
        return Ok(Some(token));
    }
    if ctx.options.skip_prompts {
        return Ok(None);
    }

    let token = prompter.secret(prompt, env.mask_secrets)?.trim().to_string();
    if token.is_empty() {
        return Ok(None);
    }

    let saved = env.memory.update(|m| match kind {
        TokenKind::Github => m.github_key = Some(token.clone()),
        TokenKind::Vercel => m.vercel_key = Some(token.clone()),
    });
    if let Err(e) = saved {
        prompter.warn(&format!("Could not remember the token: {:#}", e));
    }
    Ok(Some(token))
}

/// Make sure `dir` is a git repository with at least one commit
pub async fn ensure_local_repo<P: Prompter>(
    dir: &Path,
    commit_message: &str,
    prompter: &mut P,
) -> bool {
    let result: anyhow::Result<()> = async {
        if !git::is_git_repo(dir).await {
            git::init(dir, false).await?;
            prompter.success("Initialized a git repository");
        }
        if git::commit_all(dir, commit_message).await? {
            prompter.success("Created the initial commit");
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            prompter.warn(&format!("Git setup failed: {:#}", e));
            false
        }
    }
}

async fn github_owner<P: Prompter>(
    env: &DeployEnv,
    client: &GithubClient,
    prompter: &mut P,
) -> Option<String> {
    if let Some(name) = env.memory.load().github_username.filter(|n| !n.is_empty()) {
        return Some(name);
    }
    match client.authenticated_user().await {
        Ok(login) => {
            if let Err(e) = env.memory.update(|m| m.github_username = Some(login.clone())) {
                tracing::debug!("Could not remember GitHub username: {:#}", e);
            }
            Some(login)
        }
        Err(e) => {
            prompter.warn(&format!("Could not identify the GitHub user: {:#}", e));
            None
        }
    }
}

fn choose_privacy<P: Prompter>(ctx: &RunContext, prompter: &mut P) -> Result<RepoPrivacy> {
    if let Some(privacy) = ctx.config.repo_privacy {
        return Ok(privacy);
    }
    if ctx.options.skip_prompts {
        return Ok(RepoPrivacy::Public);
    }
    let options = [
        SelectOption::new("Public repository")
            .hint("Anyone can see the repository (recommended for open source)"),
        SelectOption::new("Private repository")
            .hint("Only you and collaborators can see the repository"),
    ];
    Ok(match prompter.select("Choose repository privacy setting", &options)? {
        1 => RepoPrivacy::Private,
        _ => RepoPrivacy::Public,
    })
}

/// A GitHub repository the project has been pushed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRepo {
    pub owner: String,
    pub name: String,
    pub default_branch: Option<String>,
}

impl PublishedRepo {
    /// `owner/name`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Create (or reuse) a GitHub repository named after `repo_name` and push
/// the local default branch to it. `None` when any step could not be done.
pub async fn publish_to_github<P: Prompter>(
    env: &DeployEnv,
    ctx: &RunContext,
    repo_name: &str,
    project_dir: &Path,
    prompter: &mut P,
) -> Result<Option<PublishedRepo>> {
    let Some(github_token) = ensure_token(env, ctx, TokenKind::Github, prompter)? else {
        prompter.warn("No GitHub token available, skipping GitHub and Vercel setup");
        return Ok(None);
    };
    let github = GithubClient::new(env.endpoints.github_api.clone(), env.client.clone(), github_token);
    let Some(owner) = github_owner(env, &github, prompter).await else {
        return Ok(None);
    };

    let choice = match github
        .negotiate_repo_name(&owner, repo_name, ctx.options.skip_prompts, prompter)
        .await
    {
        Ok(choice) => choice,
        Err(e @ crate::error::Error::Cancelled) => return Err(e),
        Err(e) => {
            prompter.warn(&format!("GitHub repository check failed: {}", e));
            return Ok(None);
        }
    };

    if !choice.exists {
        let privacy = choose_privacy(ctx, prompter)?;
        if let Err(e) = github
            .create_repo(&choice.name, privacy == RepoPrivacy::Private)
            .await
        {
            prompter.error(&format!("{:#}", e));
            return Ok(None);
        }
        prompter.success(&format!("Created GitHub repository {}/{}", owner, choice.name));
    }

    let remote = github::remote_url(&owner, &choice.name);
    let pushed: anyhow::Result<()> = async {
        git::set_remote(project_dir, "origin", &remote).await?;
        git::push(project_dir, "origin").await
    }
    .await;
    if let Err(e) = pushed {
        prompter.warn(&format!("Failed to push to {}: {:#}", remote, e));
        prompter.info(&format!(
            "You can set up the remote manually:\ncd {}\ngit remote add origin {}\ngit push -u origin {}",
            project_dir.display(),
            remote,
            git::DEFAULT_BRANCH
        ));
        return Ok(None);
    }

    Ok(Some(PublishedRepo {
        owner,
        name: choice.name,
        default_branch: choice.default_branch,
    }))
}

/// Link `repo` to a Vercel project and start a production deployment.
/// Returns the deployment URL and the primary domain.
pub async fn deploy_to_vercel<P: Prompter>(
    env: &DeployEnv,
    ctx: &RunContext,
    repo: &PublishedRepo,
    prompter: &mut P,
) -> Result<Option<(String, String)>> {
    let Some(vercel_token) = ensure_token(env, ctx, TokenKind::Vercel, prompter)? else {
        prompter.warn("No Vercel token available, skipping deployment");
        return Ok(None);
    };
    let vercel = VercelClient::new(env.endpoints.vercel_api.clone(), env.client.clone(), vercel_token);
    let slug = repo.slug();

    if let Err(e) = vercel.create_project(&repo.name, &slug).await {
        prompter.warn(&format!("{:#}", e));
    }
    let git_ref = repo.default_branch.as_deref().unwrap_or(git::DEFAULT_BRANCH);
    let deployment = match vercel.deploy(&repo.name, &slug, git_ref).await {
        Ok(deployment) => deployment,
        Err(e) => {
            prompter.error(&format!("{:#}", e));
            return Ok(None);
        }
    };
    prompter.success(&format!("Deployment started: https://{}", deployment.url));

    let domains = vercel.resolve_domains(&repo.name).await;
    Ok(Some((deployment.url, domains.primary)))
}

/// Run local git, then GitHub and Vercel when `service` asks for it.
/// Only user cancellation is returned as an error.
pub async fn deploy_project<P: Prompter>(
    env: &DeployEnv,
    ctx: &RunContext,
    project: &ProjectConfig,
    project_dir: &Path,
    service: DeployService,
    prompter: &mut P,
) -> Result<DeployOutcome> {
    let mut outcome = DeployOutcome {
        service,
        ..Default::default()
    };

    outcome.git_initialized = ensure_local_repo(project_dir, &env.commit_message, prompter).await;
    if service == DeployService::None || !outcome.git_initialized {
        return Ok(outcome);
    }

    let Some(repo) =
        publish_to_github(env, ctx, &project.project_name, project_dir, prompter).await?
    else {
        return Ok(outcome);
    };
    outcome.repo = Some(repo.slug());

    if let Some((url, domain)) = deploy_to_vercel(env, ctx, &repo, prompter).await? {
        outcome.deployment_url = Some(url);
        outcome.domain = Some(domain);
    }
    Ok(outcome)
}
