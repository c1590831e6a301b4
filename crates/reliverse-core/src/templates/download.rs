//! Fresh template downloads from a git hosting archive endpoint
//!
//! Archives are zip files whose entries all live under a single top-level
//! folder (`<repo>-<ref>/...`). That folder is stripped on extraction so the
//! template's files land directly in the target directory.

use super::registry::Template;
use crate::http;
use anyhow::{Context, Result};
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use url::Url;
use zip::ZipArchive;

/// Fetches a template fresh into a destination directory
#[allow(async_fn_in_trait)]
pub trait Downloader {
    /// Materialize `template` into `destination` and return the directory
    async fn download(&self, template: &Template, destination: &Path) -> Result<PathBuf>;
}

/// Downloads `{base}/{author}/{name}/archive/HEAD.zip`
pub struct ArchiveDownloader {
    client: reqwest::Client,
    base: Url,
}

impl ArchiveDownloader {
    pub fn new(base: Url, client: reqwest::Client) -> Self {
        Self { client, base }
    }

    fn archive_url(&self, template: &Template) -> Result<Url> {
        http::endpoint(
            &self.base,
            &[&template.author, &template.name, "archive", "HEAD.zip"],
        )
    }
}

impl Downloader for ArchiveDownloader {
    async fn download(&self, template: &Template, destination: &Path) -> Result<PathBuf> {
        ensure_empty_destination(destination)?;

        let url = self.archive_url(template)?;
        tracing::debug!("Downloading {} from {}", template.id, url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch template archive: {}", template.id))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch template '{}' from {}: HTTP {}",
                template.id,
                url,
                response.status()
            );
        }

        let bytes = response.bytes().await?;
        let written = extract_archive(&bytes, destination)?;
        tracing::debug!("Extracted {} files into {}", written, destination.display());

        Ok(destination.to_path_buf())
    }
}

/// Refuse to extract over an existing, non-empty directory
fn ensure_empty_destination(destination: &Path) -> Result<()> {
    if let Ok(mut entries) = std::fs::read_dir(destination) {
        if entries.next().is_some() {
            anyhow::bail!(
                "Target directory already exists and is not empty: {}",
                destination.display()
            );
        }
    }
    Ok(())
}

/// Extract a zip archive into `destination`, dropping the top-level folder.
/// Returns the number of files written.
pub fn extract_archive(zip_bytes: &[u8], destination: &Path) -> Result<usize> {
    let mut archive =
        ZipArchive::new(Cursor::new(zip_bytes)).context("Failed to read template archive")?;

    std::fs::create_dir_all(destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        let Some(enclosed) = file.enclosed_name() else {
            tracing::warn!("Skipping unsafe archive entry: {}", file.name());
            continue;
        };

        // Strip the `<repo>-<ref>/` folder
        let relative: PathBuf = enclosed
            .components()
            .skip(1)
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = destination.join(&relative);
        if file.is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        std::fs::write(&target, &contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        written += 1;
    }

    if written == 0 {
        anyhow::bail!("Template archive contained no files");
    }

    Ok(written)
}
