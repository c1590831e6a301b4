//! CLI version check against the npm registry's dist-tags

use crate::http;
use anyhow::Result;
use semver::Version;
use serde::Deserialize;
use url::Url;

/// Why the running CLI deserves a warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionWarning {
    /// Pre-release published under the beta channel
    Beta,
    /// Built from the unmaintained `next` tag
    Next,
    /// Older than the `latest` tag
    Outdated { current: String, latest: String },
}

impl VersionWarning {
    /// Lines shown to the user
    pub fn message(&self, package: &str, upgrade_command: &str) -> String {
        match self {
            VersionWarning::Beta => format!(
                "You are using a beta version of {}.\nPlease report any bugs you encounter.",
                package
            ),
            VersionWarning::Next => format!(
                "You are running {} with the @next tag which is no longer maintained.\n\
                 Please run the CLI with: {}",
                package, upgrade_command
            ),
            VersionWarning::Outdated { current, latest } => format!(
                "You are using an outdated version of {}.\n\
                 Your version: {}. Latest version in the npm registry: {}.\n\
                 Consider updating: {}",
                package, current, latest, upgrade_command
            ),
        }
    }
}

/// Compare the running version against the registry's `latest`.
/// Unparsable versions never produce an outdated warning.
pub fn check_version(current: &str, latest: Option<&str>) -> Option<VersionWarning> {
    if current.contains("beta") {
        return Some(VersionWarning::Beta);
    }
    if current.contains("next") {
        return Some(VersionWarning::Next);
    }

    let latest = latest?;
    let current_ver = parse_version(current).ok()?;
    let latest_ver = parse_version(latest).ok()?;

    if current_ver < latest_ver {
        Some(VersionWarning::Outdated {
            current: current.to_string(),
            latest: latest.to_string(),
        })
    } else {
        None
    }
}

/// Parse version string, handling a leading `v`
pub fn parse_version(version_str: &str) -> Result<Version> {
    let cleaned = version_str.strip_prefix('v').unwrap_or(version_str);
    Version::parse(cleaned).map_err(|e| anyhow::anyhow!("Invalid version '{}': {}", version_str, e))
}

#[derive(Debug, Deserialize)]
struct DistTags {
    latest: String,
}

/// Fetch the `latest` dist-tag of `package`. Any failure reads as `None`.
pub async fn fetch_latest(client: &reqwest::Client, registry: &Url, package: &str) -> Option<String> {
    let result: Result<String> = async {
        let url = http::endpoint(registry, &["-", "package", package, "dist-tags"])?;
        let response = client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("HTTP {} from {}", response.status(), url);
        }
        Ok(response.json::<DistTags>().await?.latest)
    }
    .await;

    match result {
        Ok(latest) => Some(latest),
        Err(e) => {
            tracing::debug!("Version check for {} failed: {:#}", package, e);
            None
        }
    }
}
