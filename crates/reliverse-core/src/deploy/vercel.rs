//! Vercel REST client: project creation, deployments and domains

use crate::http;
use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VercelProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub ready_state: Option<String>,
}

/// Domains attached to a project after www-grouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDomains {
    pub domains: Vec<String>,
    pub primary: String,
}

#[derive(Debug, Deserialize)]
struct DomainsResponse {
    #[serde(default)]
    domains: Vec<DomainEntry>,
}

#[derive(Debug, Deserialize)]
struct DomainEntry {
    name: Option<String>,
}

pub fn default_domain(project_name: &str) -> String {
    format!("{}.vercel.app", project_name)
}

/// Collapse `www.` variants onto their base domain. Within a group the
/// non-www name wins unless only the www name exists. Group order follows
/// first appearance.
pub fn effective_domains(names: &[String], project_name: &str) -> ProjectDomains {
    let mut groups: Vec<(String, Vec<&String>)> = Vec::new();
    for name in names.iter().filter(|n| !n.is_empty()) {
        let base = name.strip_prefix("www.").unwrap_or(name.as_str());
        match groups.iter_mut().find(|(b, _)| b.as_str() == base) {
            Some((_, group)) => group.push(name),
            None => groups.push((base.to_string(), vec![name])),
        }
    }

    let domains: Vec<String> = groups
        .into_iter()
        .filter_map(|(_, group)| {
            group
                .iter()
                .find(|d| !d.starts_with("www."))
                .or_else(|| group.first())
                .map(|d| d.to_string())
        })
        .collect();

    if domains.is_empty() {
        let fallback = default_domain(project_name);
        return ProjectDomains {
            domains: vec![fallback.clone()],
            primary: fallback,
        };
    }

    ProjectDomains {
        primary: domains[0].clone(),
        domains,
    }
}

pub struct VercelClient {
    client: reqwest::Client,
    base: Url,
    token: String,
}

impl VercelClient {
    pub fn new(base: Url, client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            base,
            token: token.into(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        http::endpoint(&self.base, segments)
    }

    /// Create a Next.js project linked to the GitHub repository `owner/repo`
    pub async fn create_project(&self, name: &str, github_repo: &str) -> Result<VercelProject> {
        let resp = self
            .client
            .post(self.url(&["v10", "projects"])?)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "name": name,
                "framework": "nextjs",
                "gitRepository": { "type": "github", "repo": github_repo },
            }))
            .send()
            .await
            .context("Failed to reach Vercel")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vercel project creation failed: HTTP {} {}", status, body.trim());
        }
        resp.json().await.context("Failed to parse Vercel project response")
    }

    /// Trigger a production deployment of `github_repo` at `git_ref`
    pub async fn deploy(
        &self,
        project_name: &str,
        github_repo: &str,
        git_ref: &str,
    ) -> Result<Deployment> {
        let (org, repo) = github_repo
            .split_once('/')
            .with_context(|| format!("Expected <owner>/<repo>, got {}", github_repo))?;

        let resp = self
            .client
            .post(self.url(&["v13", "deployments"])?)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "name": project_name,
                "project": project_name,
                "target": "production",
                "gitSource": { "type": "github", "org": org, "repo": repo, "ref": git_ref },
            }))
            .send()
            .await
            .context("Failed to reach Vercel")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vercel deployment failed: HTTP {} {}", status, body.trim());
        }
        resp.json().await.context("Failed to parse Vercel deployment response")
    }

    pub async fn project_domains(&self, project_name: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(self.url(&["v9", "projects", project_name, "domains"])?)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to reach Vercel")?
            .error_for_status()
            .context("Vercel domains endpoint returned error status")?;
        let body: DomainsResponse = resp
            .json()
            .await
            .context("Failed to parse Vercel domains response")?;
        Ok(body.domains.into_iter().filter_map(|d| d.name).collect())
    }

    /// Effective project domains; failures fall back to `<project>.vercel.app`
    pub async fn resolve_domains(&self, project_name: &str) -> ProjectDomains {
        match self.project_domains(project_name).await {
            Ok(names) => effective_domains(&names, project_name),
            Err(e) => {
                tracing::warn!("Failed to get Vercel domain: {:#}", e);
                effective_domains(&[], project_name)
            }
        }
    }
}
