//! Compose `.env` from `.env.example`

use crate::error::Result;
use crate::prompt::Prompter;
use anyhow::Context;
use std::path::Path;
use url::Url;

const ENV_EXAMPLE: &str = ".env.example";
const ENV_FILE: &str = ".env";

/// What happened to each key of the example file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvReport {
    /// Example came from the fallback URL rather than the project
    pub used_fallback: bool,
    pub kept: Vec<String>,
    pub filled: Vec<String>,
    /// Keys left empty (unattended, or the user entered nothing)
    pub missing: Vec<String>,
}

const SECRET_SEGMENTS: &[&str] = &[
    "SECRET", "TOKEN", "PASSWORD", "PASS", "KEY", "APIKEY", "AUTH", "CREDENTIALS",
];

/// Keys whose values should be masked while typed. Matches whole
/// `_`-separated segments, so `AUTHOR_NAME` is not a secret.
pub fn is_secret_key(key: &str) -> bool {
    key.split('_').any(|segment| {
        SECRET_SEGMENTS
            .iter()
            .any(|marker| segment.eq_ignore_ascii_case(marker))
    })
}

/// Escape `$` wherever dotenv would substitute it, so values are read
/// literally. Single-quoted values and already escaped dollars are left alone.
fn escape_substitutions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_single = false;
    let mut in_double = false;
    let mut in_comment = false;
    let mut escaped = false;
    let mut prev = '\n';
    for c in text.chars() {
        if in_comment {
            in_comment = c != '\n';
        } else if escaped {
            escaped = false;
        } else {
            match c {
                '#' if !in_single && !in_double && prev.is_whitespace() => in_comment = true,
                '\\' if !in_single => escaped = true,
                '\'' if !in_double => in_single = !in_single,
                '"' if !in_single => in_double = !in_double,
                '$' if !in_single => out.push('\\'),
                _ => {}
            }
        }
        out.push(c);
        prev = c;
    }
    out
}

/// Parse dotenv text into ordered key/value pairs. Values are taken
/// literally: `$NAME` is never expanded.
pub fn parse_env(text: &str) -> anyhow::Result<Vec<(String, String)>> {
    let literal = escape_substitutions(text);
    dotenvy::from_read_iter(literal.as_bytes())
        .map(|item| item.context("Malformed env file"))
        .collect()
}

fn quote(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('$', "\\$");
    format!("\"{}\"", escaped)
}

pub fn render_env(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        out.push_str(key);
        out.push('=');
        out.push_str(&quote(value));
        out.push('\n');
    }
    out
}

async fn load_example(
    project_dir: &Path,
    fallback: &Url,
    client: &reqwest::Client,
) -> anyhow::Result<(String, bool)> {
    let local = project_dir.join(ENV_EXAMPLE);
    if local.is_file() {
        let text = tokio::fs::read_to_string(&local)
            .await
            .with_context(|| format!("Failed to read {}", local.display()))?;
        return Ok((text, false));
    }

    tracing::debug!("No {} in project, fetching {}", ENV_EXAMPLE, fallback);
    let text = client
        .get(fallback.clone())
        .send()
        .await
        .context("Failed to fetch fallback .env.example")?
        .error_for_status()
        .context("Fallback .env.example returned error status")?
        .text()
        .await
        .context("Failed to read fallback .env.example")?;
    Ok((text, true))
}

/// Write `<project>/.env` with every key of the example file.
///
/// Values already present in an existing `.env` are kept. Empty keys are
/// prompted for unless `skip_prompts` is set, masked when `mask_secrets`
/// is set and the key looks secret.
pub async fn compose_env_file<P: Prompter>(
    project_dir: &Path,
    fallback: &Url,
    client: &reqwest::Client,
    mask_secrets: bool,
    skip_prompts: bool,
    prompter: &mut P,
) -> Result<EnvReport> {
    let (example, used_fallback) = load_example(project_dir, fallback, client).await?;
    let example = parse_env(&example)?;

    let env_path = project_dir.join(ENV_FILE);
    let existing = match tokio::fs::read_to_string(&env_path).await {
        Ok(text) => parse_env(&text).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable {}: {:#}", env_path.display(), e);
            Vec::new()
        }),
        Err(_) => Vec::new(),
    };

    let mut report = EnvReport {
        used_fallback,
        ..Default::default()
    };
    let mut pairs = Vec::with_capacity(example.len());

    for (key, example_value) in example {
        let current = existing
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty());
        if let Some(value) = current {
            report.kept.push(key.clone());
            pairs.push((key, value));
            continue;
        }
        if !example_value.is_empty() {
            report.kept.push(key.clone());
            pairs.push((key, example_value));
            continue;
        }

        let value = if skip_prompts {
            String::new()
        } else if mask_secrets && is_secret_key(&key) {
            prompter.secret(&format!("Enter value for {}", key), true)?
        } else {
            prompter.input(&format!("Enter value for {}", key), "")?
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            report.missing.push(key.clone());
        } else {
            report.filled.push(key.clone());
        }
        pairs.push((key, value));
    }

    tokio::fs::write(&env_path, render_env(&pairs))
        .await
        .with_context(|| format!("Failed to write {}", env_path.display()))?;

    if !report.missing.is_empty() {
        prompter.warn(&format!(
            "Fill in these values in .env before running the project: {}",
            report.missing.join(", ")
        ));
    }
    Ok(report)
}
