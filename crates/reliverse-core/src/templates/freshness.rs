//! Remote template metadata: when was the upstream repository last pushed?

use super::registry::Template;
use crate::http;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

/// Source of upstream push timestamps
///
/// Implementations must never fail: any problem is reported as `None`,
/// meaning "freshness unknown".
#[allow(async_fn_in_trait)]
pub trait FreshnessSource {
    async fn fetch_pushed_at(&self, template: &Template) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Deserialize)]
struct RepoInfoResponse {
    repo: Option<RepoInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoInfo {
    pushed_at: Option<DateTime<Utc>>,
}

/// Client for a repository-info API answering `GET /repos/{owner}/{repo}`
/// with `{ "repo": { "pushedAt": "<ISO timestamp>" } }`
pub struct RepoInfoClient {
    client: reqwest::Client,
    base: Url,
}

impl RepoInfoClient {
    pub fn new(base: Url, client: reqwest::Client) -> Self {
        Self { client, base }
    }

    async fn try_fetch(&self, template: &Template) -> anyhow::Result<Option<DateTime<Utc>>> {
        let url = http::endpoint(&self.base, &["repos", &template.author, &template.name])?;
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("HTTP {} from {}", response.status(), url);
        }
        let body: RepoInfoResponse = response.json().await?;
        Ok(body.repo.and_then(|r| r.pushed_at))
    }
}

impl FreshnessSource for RepoInfoClient {
    async fn fetch_pushed_at(&self, template: &Template) -> Option<DateTime<Utc>> {
        match self.try_fetch(template).await {
            Ok(pushed_at) => pushed_at,
            Err(e) => {
                tracing::debug!("Freshness check for {} failed: {:#}", template.id, e);
                None
            }
        }
    }
}
