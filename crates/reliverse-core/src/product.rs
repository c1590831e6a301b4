//! Product configuration trait for CLI binaries
//!
//! The scaffolding pipeline never hardcodes product identity, remote
//! endpoints or credential sources. Each binary implements this trait and
//! hands it to the flows.

use anyhow::{Context, Result};
use url::Url;

/// Remote endpoints used by the pipeline, each overridable through an
/// environment variable
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Repository metadata API answering `GET /repos/{owner}/{repo}`
    pub repo_info: Url,
    /// Git hosting root serving `/{owner}/{repo}/archive/HEAD.zip`
    pub archive: Url,
    /// npm registry root serving `/-/package/{name}/dist-tags`
    pub npm_registry: Url,
    pub github_api: Url,
    pub vercel_api: Url,
    /// `.env.example` used when a template ships without one
    pub env_example: Url,
}

impl Endpoints {
    /// Build endpoints from defaults, honoring `RELIVERSE_*_URL` overrides
    pub fn from_env(env_example_default: &str) -> Result<Self> {
        Ok(Self {
            repo_info: env_url("RELIVERSE_REPO_INFO_URL", "https://ungh.cc")?,
            archive: env_url("RELIVERSE_ARCHIVE_URL", "https://github.com")?,
            npm_registry: env_url("RELIVERSE_NPM_REGISTRY_URL", "https://registry.npmjs.org")?,
            github_api: env_url("RELIVERSE_GITHUB_API_URL", "https://api.github.com")?,
            vercel_api: env_url("RELIVERSE_VERCEL_API_URL", "https://api.vercel.com")?,
            env_example: env_url("RELIVERSE_ENV_EXAMPLE_URL", env_example_default)?,
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url> {
    let url_str = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&url_str).with_context(|| format!("Invalid URL in {}: {}", var, url_str))
}

/// Configuration trait for CLI products built on this library
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command, npm package lookups)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Package name published to npm, used for the outdated-version warning
    fn npm_package(&self) -> &'static str {
        self.name()
    }

    /// URL for product documentation
    fn docs_url(&self) -> &'static str;

    /// Per-user directory name under the home directory (cache, memory)
    fn home_dir_name(&self) -> &'static str {
        ".reliverse"
    }

    /// Fallback `.env.example` for templates that do not ship one
    fn default_env_example_url(&self) -> &'static str;

    /// Environment variable holding a GitHub token
    fn github_token_env(&self) -> &'static str {
        "GITHUB_TOKEN"
    }

    /// Environment variable holding a Vercel token
    fn vercel_token_env(&self) -> &'static str {
        "VERCEL_TOKEN"
    }

    /// Upgrade command shown in version warnings
    fn upgrade_command(&self) -> String {
        format!("npx {}@latest", self.npm_package())
    }

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }

    /// Remote endpoints, with environment overrides applied
    fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::from_env(self.default_env_example_url())
    }
}
