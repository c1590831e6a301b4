//! Template catalog, caching, fetching and materialization
//!
//! This module provides:
//! - The static template registry
//! - The on-disk template cache and its freshness metadata
//! - Archive downloads from the git host
//! - The acquisition pipeline choosing between cache and download
//! - Placeholder replacement over a materialized project

pub mod acquire;
pub mod cache;
pub mod copier;
pub mod download;
pub mod freshness;
pub mod registry;
pub mod replace;

pub use acquire::{decide_cache_use, Acquirer, Acquisition, CacheDecision};
pub use cache::{CachedTemplateInfo, GithubInfo, TemplateCache};
pub use download::{ArchiveDownloader, Downloader};
pub use freshness::{FreshnessSource, RepoInfoClient};
pub use registry::{Template, TemplateRegistry};
pub use replace::{build_replacements, ReplacementMap, ReplacementReport};

use chrono::{DateTime, Utc};

/// A registry entry together with what the local cache knows about it
#[derive(Debug, Clone)]
pub struct TemplateListing {
    pub template: Template,
    pub cached: bool,
    pub cached_at: Option<DateTime<Utc>>,
}

/// Every registry template with its cache status, in registry order
pub async fn list_with_cache_status(
    registry: &TemplateRegistry,
    cache: &TemplateCache,
) -> Vec<TemplateListing> {
    let mut listings = Vec::with_capacity(registry.templates().len());
    for template in registry.templates() {
        let cached = cache.exists(template).await;
        let cached_at = if cached {
            cache.info(&template.id).await.map(|info| info.cached_at)
        } else {
            None
        };
        listings.push(TemplateListing {
            template: template.clone(),
            cached,
            cached_at,
        });
    }
    listings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_listing_reports_cached_templates() {
        let root = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.txt"), "a").unwrap();

        let registry = TemplateRegistry::from_templates(vec![
            Template::new("acme/one", "").unwrap(),
            Template::new("acme/two", "").unwrap(),
        ]);
        let cache = TemplateCache::new(root.path());
        cache
            .save(registry.find("acme/two").unwrap(), src.path(), None)
            .await
            .unwrap();

        let listings = list_with_cache_status(&registry, &cache).await;

        assert_eq!(listings.len(), 2);
        assert!(!listings[0].cached);
        assert!(listings[0].cached_at.is_none());
        assert!(listings[1].cached);
        assert!(listings[1].cached_at.is_some());
    }
}
