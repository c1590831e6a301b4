//! Local git operations through the `git` CLI

use crate::runtime::tool;
use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_BRANCH: &str = "main";

/// Snapshot of a working tree used to decide which git actions make sense
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    pub is_repo: bool,
    /// Modified, staged and untracked entries
    pub uncommitted: usize,
    /// Commits ahead of the upstream branch
    pub unpushed: usize,
    pub has_remote: bool,
    pub has_commits: bool,
}

async fn git(dir: &Path, args: &[&str]) -> Result<String> {
    tool::run_captured("git", args, dir).await
}

pub async fn is_git_repo(dir: &Path) -> bool {
    if !dir.join(".git").exists() {
        return false;
    }
    matches!(
        git(dir, &["rev-parse", "--is-inside-work-tree"]).await.as_deref(),
        Ok("true")
    )
}

/// Create a repository on the default branch. With `allow_reinit`, an
/// existing `.git` directory is removed first.
pub async fn init(dir: &Path, allow_reinit: bool) -> Result<()> {
    let git_dir = dir.join(".git");
    if git_dir.exists() {
        if !allow_reinit {
            anyhow::bail!("{} is already a git repository", dir.display());
        }
        tokio::fs::remove_dir_all(&git_dir)
            .await
            .with_context(|| format!("Failed to remove {}", git_dir.display()))?;
    }
    git(dir, &["init", "--quiet"]).await?;
    git(dir, &["symbolic-ref", "HEAD", &format!("refs/heads/{}", DEFAULT_BRANCH)]).await?;
    Ok(())
}

/// Stage everything and commit. Returns false when there was nothing to commit.
pub async fn commit_all(dir: &Path, message: &str) -> Result<bool> {
    git(dir, &["add", "--all"]).await?;
    let staged = git(dir, &["status", "--porcelain"]).await?;
    if staged.is_empty() {
        return Ok(false);
    }
    git(dir, &["commit", "--quiet", "-m", message])
        .await
        .context("git commit failed (is user.name/user.email configured?)")?;
    Ok(true)
}

/// Point `remote` at `url`, adding it or updating its URL as needed
pub async fn set_remote(dir: &Path, remote: &str, url: &str) -> Result<()> {
    let remotes = git(dir, &["remote"]).await?;
    if remotes.lines().any(|r| r.trim() == remote) {
        let existing = git(dir, &["remote", "get-url", remote]).await?;
        if existing != url {
            git(dir, &["remote", "set-url", remote, url]).await?;
            tracing::debug!("Updated {} remote URL to {}", remote, url);
        }
    } else {
        git(dir, &["remote", "add", remote, url]).await?;
    }
    Ok(())
}

/// URL of `remote`, `None` when it is not configured
pub async fn remote_url(dir: &Path, remote: &str) -> Option<String> {
    git(dir, &["remote", "get-url", remote])
        .await
        .ok()
        .filter(|url| !url.is_empty())
}

/// Push the default branch, setting upstream
pub async fn push(dir: &Path, remote: &str) -> Result<()> {
    tool::run_streaming("git", &["push", "--set-upstream", remote, DEFAULT_BRANCH], dir).await
}

pub async fn status(dir: &Path) -> GitStatus {
    if !is_git_repo(dir).await {
        return GitStatus::default();
    }

    let uncommitted = git(dir, &["status", "--porcelain"])
        .await
        .map(|out| out.lines().filter(|l| !l.trim().is_empty()).count())
        .unwrap_or(0);
    let has_commits = git(dir, &["rev-parse", "--verify", "--quiet", "HEAD"])
        .await
        .is_ok();
    let has_remote = git(dir, &["remote"])
        .await
        .map(|out| !out.is_empty())
        .unwrap_or(false);

    let unpushed = if !has_commits {
        0
    } else if has_remote {
        match git(dir, &["rev-list", "--count", "@{upstream}..HEAD"]).await {
            Ok(count) => count.parse().unwrap_or(0),
            // No upstream yet: every local commit is unpushed
            Err(_) => git(dir, &["rev-list", "--count", "HEAD"])
                .await
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or(0),
        }
    } else {
        0
    };

    GitStatus {
        is_repo: true,
        uncommitted,
        unpushed,
        has_remote,
        has_commits,
    }
}
