//! GitHub REST client: ownership checks, repository creation and naming

use crate::error::Error;
use crate::http;
use crate::prompt::{Prompter, SelectOption};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// What GitHub says about `<owner>/<repo>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStatus {
    pub exists: bool,
    /// The token holder has admin rights on the repository
    pub is_owner: bool,
    pub default_branch: Option<String>,
}

/// Outcome of name negotiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoChoice {
    pub name: String,
    /// Reuse an existing repository instead of creating one
    pub exists: bool,
    pub default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    default_branch: Option<String>,
    permissions: Option<Permissions>,
}

#[derive(Debug, Deserialize)]
struct Permissions {
    #[serde(default)]
    admin: bool,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

/// Repository names GitHub accepts: letters, digits, `.`, `-` and `_`
pub fn is_valid_repo_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

pub fn remote_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{}/{}.git", owner, repo)
}

/// `(owner, repo)` from an https or ssh GitHub remote URL
pub fn parse_remote(url: &str) -> Option<(String, String)> {
    let path = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))?;
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.split_once('/')?;
    if owner.is_empty() || !is_valid_repo_name(repo) {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

pub struct GithubClient {
    client: reqwest::Client,
    base: Url,
    token: String,
}

impl GithubClient {
    pub fn new(base: Url, client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            base,
            token: token.into(),
        }
    }

    fn request(&self, method: reqwest::Method, segments: &[&str]) -> Result<reqwest::RequestBuilder> {
        let url = http::endpoint(&self.base, segments)?;
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json"))
    }

    /// Login of the token holder
    pub async fn authenticated_user(&self) -> Result<String> {
        let resp = self
            .request(reqwest::Method::GET, &["user"])?
            .send()
            .await
            .context("Failed to reach GitHub")?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            anyhow::bail!("Invalid GitHub token");
        }
        let user: UserResponse = resp
            .error_for_status()
            .context("GitHub user endpoint returned error status")?
            .json()
            .await
            .context("Failed to parse GitHub user response")?;
        Ok(user.login)
    }

    pub async fn check_ownership(&self, owner: &str, repo: &str) -> Result<RepoStatus> {
        let resp = self
            .request(reqwest::Method::GET, &["repos", owner, repo])?
            .send()
            .await
            .context("Failed to reach GitHub")?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Ok(RepoStatus::default()),
            StatusCode::FORBIDDEN => anyhow::bail!("GitHub API rate limit exceeded"),
            StatusCode::UNAUTHORIZED => anyhow::bail!("Invalid GitHub token"),
            _ => {}
        }

        let repo: RepoResponse = resp
            .error_for_status()
            .context("GitHub repository endpoint returned error status")?
            .json()
            .await
            .context("Failed to parse GitHub repository response")?;
        Ok(RepoStatus {
            exists: true,
            is_owner: repo.permissions.map(|p| p.admin).unwrap_or(false),
            default_branch: repo.default_branch,
        })
    }

    /// Create a repository owned by the token holder, without an initial commit
    pub async fn create_repo(&self, name: &str, private: bool) -> Result<()> {
        let resp = self
            .request(reqwest::Method::POST, &["user", "repos"])?
            .json(&serde_json::json!({
                "name": name,
                "private": private,
                "auto_init": false,
            }))
            .send()
            .await
            .context("Failed to reach GitHub")?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => anyhow::bail!(
                "GitHub token is invalid or lacks necessary permissions. Ensure your token has the 'repo' scope."
            ),
            StatusCode::UNPROCESSABLE_ENTITY => {
                anyhow::bail!("Repository '{}' already exists on GitHub or the name is invalid", name)
            }
            s => anyhow::bail!("GitHub repository creation failed: HTTP {}", s),
        }
    }

    /// Find a repository name to use, starting from `initial`.
    ///
    /// An existing repository the user owns may be reused. Unattended runs
    /// reuse owned repositories and fail on foreign ones.
    pub async fn negotiate_repo_name<P: Prompter>(
        &self,
        owner: &str,
        initial: &str,
        skip_prompts: bool,
        prompter: &mut P,
    ) -> crate::error::Result<RepoChoice> {
        let mut name = initial.to_string();
        let mut status = self.check_ownership(owner, &name).await?;

        while status.exists {
            if status.is_owner {
                let choice = if skip_prompts {
                    0
                } else {
                    let options = [
                        SelectOption::new("Use existing repository")
                            .hint("Continue working with your existing repository"),
                        SelectOption::new("Create with different name")
                            .hint("Enter a new name for the repository"),
                        SelectOption::new("Close the application")
                            .hint("Exit without completing the setup"),
                    ];
                    prompter.select(
                        &format!("Repository \"{}/{}\" already exists", owner, name),
                        &options,
                    )?
                };
                match choice {
                    0 => {
                        return Ok(RepoChoice {
                            name,
                            exists: true,
                            default_branch: status.default_branch,
                        })
                    }
                    2 => return Err(Error::Cancelled),
                    _ => {}
                }
            } else if skip_prompts {
                return Err(Error::Other(anyhow::anyhow!(
                    "Repository \"{}/{}\" already exists and is not yours",
                    owner,
                    name
                )));
            }

            let candidate = prompter.input(
                &format!(
                    "Repository \"{}\" {}. Please enter a different name:",
                    name,
                    if status.is_owner {
                        "exists (owned by you)"
                    } else {
                        "already exists"
                    }
                ),
                &name,
            )?;
            let candidate = candidate.trim().to_string();
            if !is_valid_repo_name(&candidate) {
                prompter.warn(
                    "Repository name can only contain letters, numbers, dots, hyphens, and underscores",
                );
                continue;
            }
            name = candidate;
            status = self.check_ownership(owner, &name).await?;
        }

        Ok(RepoChoice {
            name,
            exists: false,
            default_branch: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::testing::{Answer, ScriptedPrompter};
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> GithubClient {
        GithubClient::new(
            Url::parse(&server.base_url()).unwrap(),
            http::client("create-reliverse-test"),
            "ghp_test",
        )
    }

    #[test]
    fn test_repo_name_validation() {
        assert!(is_valid_repo_name("my-app_2.0"));
        assert!(!is_valid_repo_name(""));
        assert!(!is_valid_repo_name("my app"));
        assert!(!is_valid_repo_name("a/b"));
    }

    #[test]
    fn test_parse_remote_forms() {
        let expected = Some(("alice".to_string(), "shop".to_string()));
        assert_eq!(parse_remote("https://github.com/alice/shop.git"), expected);
        assert_eq!(parse_remote("git@github.com:alice/shop.git"), expected);
        assert_eq!(parse_remote("https://github.com/alice/shop"), expected);
        assert_eq!(parse_remote(&remote_url("alice", "shop")), expected);
        assert_eq!(parse_remote("https://gitlab.com/alice/shop.git"), None);
        assert_eq!(parse_remote("https://github.com/alice"), None);
    }

    #[tokio::test]
    async fn test_check_ownership_states() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/alice/mine")
                    .header("authorization", "Bearer ghp_test");
                then.status(200).json_body(serde_json::json!({
                    "default_branch": "main",
                    "permissions": { "admin": true }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/alice/missing");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/alice/limited");
                then.status(403);
            })
            .await;

        let client = client_for(&server);
        let mine = client.check_ownership("alice", "mine").await.unwrap();
        assert!(mine.exists && mine.is_owner);
        assert_eq!(mine.default_branch.as_deref(), Some("main"));

        assert_eq!(
            client.check_ownership("alice", "missing").await.unwrap(),
            RepoStatus::default()
        );

        let err = client.check_ownership("alice", "limited").await.unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_create_repo_posts_privacy() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/user/repos").json_body(serde_json::json!({
                    "name": "shop",
                    "private": true,
                    "auto_init": false
                }));
                then.status(201).json_body(serde_json::json!({ "name": "shop" }));
            })
            .await;

        client_for(&server).create_repo("shop", true).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_authenticated_user_login() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/user");
                then.status(200).json_body(serde_json::json!({ "login": "alice" }));
            })
            .await;

        assert_eq!(client_for(&server).authenticated_user().await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_negotiate_free_name_asks_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/alice/shop");
                then.status(404);
            })
            .await;

        let mut prompter = ScriptedPrompter::default();
        let choice = client_for(&server)
            .negotiate_repo_name("alice", "shop", false, &mut prompter)
            .await
            .unwrap();

        assert_eq!(choice.name, "shop");
        assert!(!choice.exists);
        assert!(prompter.asked.is_empty());
    }

    #[tokio::test]
    async fn test_negotiate_foreign_repo_asks_for_new_name() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/alice/shop");
                then.status(200)
                    .json_body(serde_json::json!({ "permissions": { "admin": false } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/alice/shop-2");
                then.status(404);
            })
            .await;

        let mut prompter = ScriptedPrompter::new([
            Answer::Text("bad name".into()),
            Answer::Text("shop-2".into()),
        ]);
        let choice = client_for(&server)
            .negotiate_repo_name("alice", "shop", false, &mut prompter)
            .await
            .unwrap();

        assert_eq!(choice.name, "shop-2");
        assert!(!choice.exists);
        assert!(prompter.logged("letters, numbers"));
    }

    #[tokio::test]
    async fn test_negotiate_owned_repo_reuse_and_close() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/alice/shop");
                then.status(200).json_body(serde_json::json!({
                    "default_branch": "main",
                    "permissions": { "admin": true }
                }));
            })
            .await;
        let client = client_for(&server);

        let mut prompter = ScriptedPrompter::new([Answer::Select(0)]);
        let choice = client
            .negotiate_repo_name("alice", "shop", false, &mut prompter)
            .await
            .unwrap();
        assert!(choice.exists);
        assert_eq!(choice.default_branch.as_deref(), Some("main"));

        let mut prompter = ScriptedPrompter::new([Answer::Select(2)]);
        let err = client
            .negotiate_repo_name("alice", "shop", false, &mut prompter)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));

        let mut prompter = ScriptedPrompter::default();
        let choice = client
            .negotiate_repo_name("alice", "shop", true, &mut prompter)
            .await
            .unwrap();
        assert!(choice.exists);
        assert!(prompter.asked.is_empty());
    }
}
