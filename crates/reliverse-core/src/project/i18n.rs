//! Locale-segment routing for Next.js app-router projects

use anyhow::{Context, Result};
use std::path::Path;

/// Entries of `src/app` that stay outside the `[locale]` segment
const KEEP_AT_APP_ROOT: &[&str] = &["api", "globals.css", "favicon.ico", "[locale]"];

const DEFAULT_MESSAGES: &str = "{\n  \"home\": {\n    \"title\": \"Welcome\"\n  }\n}\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I18nOutcome {
    /// `src/app/[locale]` was already present
    AlreadyEnabled,
    Enabled { moved: usize },
    /// Disabled by the user, or the project has no `src/app`
    Skipped,
}

pub fn is_enabled(project_dir: &Path) -> bool {
    project_dir.join("src/app/[locale]").is_dir()
}

/// Move route entries under `src/app/[locale]` and create `messages/en.json`
pub fn setup_i18n(project_dir: &Path, enable: bool) -> Result<I18nOutcome> {
    if is_enabled(project_dir) {
        return Ok(I18nOutcome::AlreadyEnabled);
    }
    let app_dir = project_dir.join("src/app");
    if !enable || !app_dir.is_dir() {
        return Ok(I18nOutcome::Skipped);
    }

    let locale_dir = app_dir.join("[locale]");
    std::fs::create_dir_all(&locale_dir)
        .with_context(|| format!("Failed to create {}", locale_dir.display()))?;

    let mut moved = 0;
    let entries = std::fs::read_dir(&app_dir)
        .with_context(|| format!("Failed to read {}", app_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if KEEP_AT_APP_ROOT.iter().any(|keep| name == *keep) {
            continue;
        }
        let target = locale_dir.join(&name);
        std::fs::rename(entry.path(), &target).with_context(|| {
            format!("Failed to move {} into [locale]", entry.path().display())
        })?;
        moved += 1;
    }

    let messages_dir = project_dir.join("messages");
    std::fs::create_dir_all(&messages_dir)
        .with_context(|| format!("Failed to create {}", messages_dir.display()))?;
    let en = messages_dir.join("en.json");
    if !en.exists() {
        std::fs::write(&en, DEFAULT_MESSAGES)
            .with_context(|| format!("Failed to write {}", en.display()))?;
    }

    Ok(I18nOutcome::Enabled { moved })
}
