//! Template acquisition: decide between the local cache and a fresh download,
//! then materialize the chosen template into the project directory.

use super::cache::TemplateCache;
use super::copier;
use super::download::Downloader;
use super::freshness::FreshnessSource;
use super::registry::{Template, TemplateRegistry};
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::prompt::{Prompter, SelectOption};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Outcome of comparing the cached copy against upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// Unattended mode: use the cache without comparing
    UseLocalUnattended,
    /// Upstream is not newer than the cached copy
    UseLocalUpToDate,
    /// Upstream has been pushed since the copy was saved
    AskNewerAvailable {
        local: DateTime<Utc>,
        remote: DateTime<Utc>,
    },
    /// At least one timestamp is unknown
    AskUseLocal,
}

/// Decide what to do with an existing cached copy.
///
/// Equal timestamps count as up to date; only a strictly newer upstream
/// push asks the user. A missing local record and an unreachable upstream
/// are treated the same way.
pub fn decide_cache_use(
    skip_prompts: bool,
    local_pushed_at: Option<DateTime<Utc>>,
    remote_pushed_at: Option<DateTime<Utc>>,
) -> CacheDecision {
    if skip_prompts {
        return CacheDecision::UseLocalUnattended;
    }
    match (local_pushed_at, remote_pushed_at) {
        (Some(local), Some(remote)) if remote > local => {
            CacheDecision::AskNewerAvailable { local, remote }
        }
        (Some(_), Some(_)) => CacheDecision::UseLocalUpToDate,
        _ => CacheDecision::AskUseLocal,
    }
}

/// Result of a successful acquisition
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub template: Template,
    pub project_dir: PathBuf,
    /// The project was restored from the local cache
    pub used_local: bool,
    /// A fresh download was saved into the cache
    pub saved_to_cache: bool,
}

/// The acquisition pipeline and its collaborators
pub struct Acquirer<'a, F, D> {
    pub registry: &'a TemplateRegistry,
    pub cache: &'a TemplateCache,
    pub freshness: &'a F,
    pub downloader: &'a D,
}

impl<F: FreshnessSource, D: Downloader> Acquirer<'_, F, D> {
    /// Resolve `template_id`, then restore or download it into the project
    /// directory for `project_name`
    pub async fn acquire<P: Prompter>(
        &self,
        ctx: &RunContext,
        template_id: &str,
        project_name: &str,
        prompter: &mut P,
    ) -> Result<Acquisition> {
        let template = self.registry.find(template_id)?.clone();
        let project_dir = ctx.project_dir(project_name);
        let existed_before = project_dir.exists();
        let entries_before = copier::entry_names(&project_dir);

        let mut remote_pushed_at = None;
        let mut used_local = false;

        if self.cache.exists(&template).await {
            let local_info = self.cache.info(&template.id).await;
            remote_pushed_at = self.freshness.fetch_pushed_at(&template).await;
            let local_pushed_at = local_info.and_then(|info| info.github.pushed_at);

            let use_local = match decide_cache_use(
                ctx.options.skip_prompts,
                local_pushed_at,
                remote_pushed_at,
            ) {
                CacheDecision::UseLocalUnattended => {
                    prompter.info("Using local template copy (auto).");
                    true
                }
                CacheDecision::UseLocalUpToDate => {
                    prompter.info("Using local template copy (up to date)...");
                    true
                }
                CacheDecision::AskNewerAvailable { local, remote } => {
                    let options = [
                        SelectOption::new("Download latest version")
                            .hint(format!("Last updated {}", remote.format("%Y-%m-%d"))),
                        SelectOption::new("Use local copy")
                            .hint(format!("Downloaded {}", local.format("%Y-%m-%d"))),
                    ];
                    prompter.select("A newer version of the template is available", &options)? == 1
                }
                CacheDecision::AskUseLocal => {
                    prompter.confirm("Local copy found. Use it?", true)?
                }
            };

            if use_local {
                match self.cache.restore(&template, &project_dir).await {
                    Ok(files) => {
                        tracing::debug!("Restored {} files from cache", files);
                        used_local = true;
                    }
                    Err(e) => {
                        prompter.warn(&format!(
                            "Failed to use local copy, downloading instead: {:#}",
                            e
                        ));
                        if existed_before {
                            copier::remove_entries_except(&project_dir, &entries_before).await;
                        } else {
                            copier::remove_dir_best_effort(&project_dir).await;
                        }
                    }
                }
            }
        }

        if !used_local {
            prompter.info(&format!("Downloading the '{}' template...", template.id));
            if let Err(source) = self.downloader.download(&template, &project_dir).await {
                prompter.error(&format!("Failed to download template: {:#}", source));
                if !existed_before {
                    copier::remove_dir_best_effort(&project_dir).await;
                }
                return Err(Error::Download {
                    template: template.id.clone(),
                    source,
                });
            }
        }

        let mut saved_to_cache = false;
        if !used_local {
            let should_save = if ctx.options.skip_prompts {
                true
            } else {
                prompter.confirm("Save a copy of the template to your device?", true)?
            };

            if should_save {
                let pushed_at = match remote_pushed_at {
                    Some(t) => Some(t),
                    None => self.freshness.fetch_pushed_at(&template).await,
                };
                match self.cache.save(&template, &project_dir, pushed_at).await {
                    Ok(info) => {
                        saved_to_cache = true;
                        prompter.success(&format!(
                            "Template saved to {}",
                            info.local_path.display()
                        ));
                    }
                    Err(e) => prompter.warn(&format!(
                        "Failed to save template to device: {:#}",
                        e
                    )),
                }
            }
        }

        Ok(Acquisition {
            template,
            project_dir,
            used_local,
            saved_to_cache,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ReliverseConfig;
    use crate::context::RunOptions;
    use crate::prompt::testing::{Answer, ScriptedPrompter};
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::path::Path;
    use tempfile::TempDir;

    pub(crate) struct StubFreshness(pub Option<DateTime<Utc>>);

    impl FreshnessSource for StubFreshness {
        async fn fetch_pushed_at(&self, _template: &Template) -> Option<DateTime<Utc>> {
            self.0
        }
    }

    /// Writes a fixed set of files, or fails when `fail` is set
    #[derive(Default)]
    pub(crate) struct StubDownloader {
        pub files: Vec<(&'static str, &'static str)>,
        pub fail: bool,
        pub calls: Cell<usize>,
    }

    impl Downloader for StubDownloader {
        async fn download(&self, _template: &Template, destination: &Path) -> anyhow::Result<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            std::fs::create_dir_all(destination)?;
            if self.fail {
                std::fs::write(destination.join("partial"), "x")?;
                anyhow::bail!("network unreachable");
            }
            for (path, content) in &self.files {
                let target = destination.join(path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(target, content)?;
            }
            Ok(destination.to_path_buf())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    struct Fixture {
        work: TempDir,
        home: TempDir,
        registry: TemplateRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                work: TempDir::new().unwrap(),
                home: TempDir::new().unwrap(),
                registry: TemplateRegistry::from_templates(vec![
                    Template::new("acme/tpl", "Test template").unwrap()
                ]),
            }
        }

        fn ctx(&self, skip_prompts: bool) -> RunContext {
            RunContext::new(
                self.work.path(),
                self.home.path(),
                ".reliverse",
                RunOptions {
                    skip_prompts,
                    ..Default::default()
                },
                ReliverseConfig::default(),
            )
        }

        fn cache(&self) -> TemplateCache {
            TemplateCache::new(self.ctx(false).templates_dir())
        }

        async fn seed_cache(&self, pushed_at: Option<DateTime<Utc>>) {
            let src = TempDir::new().unwrap();
            std::fs::write(src.path().join("from-cache.txt"), "cached").unwrap();
            let template = self.registry.find("acme/tpl").unwrap();
            self.cache().save(template, src.path(), pushed_at).await.unwrap();
        }
    }

    fn downloader() -> StubDownloader {
        StubDownloader {
            files: vec![("from-download.txt", "fresh")],
            ..Default::default()
        }
    }

    #[test]
    fn test_decision_strictly_newer_asks() {
        let decision = decide_cache_use(false, Some(date(2024, 1, 1)), Some(date(2024, 6, 1)));
        assert_eq!(
            decision,
            CacheDecision::AskNewerAvailable {
                local: date(2024, 1, 1),
                remote: date(2024, 6, 1)
            }
        );
    }

    #[test]
    fn test_decision_equal_or_older_uses_cache() {
        assert_eq!(
            decide_cache_use(false, Some(date(2024, 6, 1)), Some(date(2024, 6, 1))),
            CacheDecision::UseLocalUpToDate
        );
        assert_eq!(
            decide_cache_use(false, Some(date(2024, 6, 1)), Some(date(2024, 1, 1))),
            CacheDecision::UseLocalUpToDate
        );
    }

    #[test]
    fn test_decision_unknown_timestamps_ask_plainly() {
        assert_eq!(
            decide_cache_use(false, None, Some(date(2024, 6, 1))),
            CacheDecision::AskUseLocal
        );
        assert_eq!(
            decide_cache_use(false, Some(date(2024, 6, 1)), None),
            CacheDecision::AskUseLocal
        );
        assert_eq!(decide_cache_use(false, None, None), CacheDecision::AskUseLocal);
    }

    #[test]
    fn test_decision_unattended_never_asks() {
        let samples = [None, Some(date(2024, 1, 1)), Some(date(2024, 6, 1))];
        for local in samples {
            for remote in samples {
                assert_eq!(
                    decide_cache_use(true, local, remote),
                    CacheDecision::UseLocalUnattended
                );
            }
        }
    }

    #[tokio::test]
    async fn test_no_cache_downloads_then_asks_to_save() {
        let fx = Fixture::new();
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(Some(date(2024, 6, 1)));
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::new([Answer::Confirm(true)]);

        let result = acquirer
            .acquire(&fx.ctx(false), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert_eq!(dl.calls.get(), 1);
        assert!(!result.used_local);
        assert!(result.saved_to_cache);
        assert_eq!(prompter.asked, vec!["Save a copy of the template to your device?"]);
        assert!(result.project_dir.join("from-download.txt").exists());

        let template = fx.registry.find("acme/tpl").unwrap();
        assert!(cache.path_for(template).join("from-download.txt").exists());
        let info = cache.info("acme/tpl").await.unwrap();
        assert_eq!(info.github.pushed_at, Some(date(2024, 6, 1)));
    }

    #[tokio::test]
    async fn test_declining_save_leaves_cache_empty() {
        let fx = Fixture::new();
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(None);
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::new([Answer::Confirm(false)]);

        let result = acquirer
            .acquire(&fx.ctx(false), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert!(!result.saved_to_cache);
        assert!(!cache.exists(fx.registry.find("acme/tpl").unwrap()).await);
    }

    #[tokio::test]
    async fn test_newer_remote_prompts_and_honors_download_choice() {
        let fx = Fixture::new();
        fx.seed_cache(Some(date(2024, 1, 1))).await;
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(Some(date(2024, 6, 1)));
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter =
            ScriptedPrompter::new([Answer::Select(0), Answer::Confirm(true)]);

        let result = acquirer
            .acquire(&fx.ctx(false), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert_eq!(prompter.asked[0], "A newer version of the template is available");
        assert_eq!(dl.calls.get(), 1);
        assert!(!result.used_local);
        assert!(result.saved_to_cache);
        // The refreshed copy replaces the stale one
        let info = cache.info("acme/tpl").await.unwrap();
        assert_eq!(info.github.pushed_at, Some(date(2024, 6, 1)));
    }

    #[tokio::test]
    async fn test_newer_remote_prompts_and_honors_local_choice() {
        let fx = Fixture::new();
        fx.seed_cache(Some(date(2024, 1, 1))).await;
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(Some(date(2024, 6, 1)));
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::new([Answer::Select(1)]);

        let result = acquirer
            .acquire(&fx.ctx(false), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert!(result.used_local);
        assert_eq!(dl.calls.get(), 0);
        assert_eq!(prompter.asked.len(), 1);
        assert!(result.project_dir.join("from-cache.txt").exists());
    }

    #[tokio::test]
    async fn test_equal_timestamps_use_cache_silently() {
        let fx = Fixture::new();
        fx.seed_cache(Some(date(2024, 6, 1))).await;
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(Some(date(2024, 6, 1)));
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::default();

        let result = acquirer
            .acquire(&fx.ctx(false), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert!(prompter.asked.is_empty());
        assert!(result.used_local);
        assert!(!result.saved_to_cache);
        assert_eq!(dl.calls.get(), 0);
        assert!(prompter.logged("up to date"));
    }

    #[tokio::test]
    async fn test_unknown_remote_falls_back_to_yes_no_prompt() {
        let fx = Fixture::new();
        fx.seed_cache(Some(date(2024, 6, 1))).await;
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(None);
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::new([Answer::Confirm(true)]);

        let result = acquirer
            .acquire(&fx.ctx(false), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert_eq!(prompter.asked, vec!["Local copy found. Use it?"]);
        assert!(result.used_local);
    }

    #[tokio::test]
    async fn test_unattended_prefers_cache_and_never_prompts() {
        let fx = Fixture::new();
        fx.seed_cache(Some(date(2024, 1, 1))).await;
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(Some(date(2024, 6, 1)));
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::default();

        let result = acquirer
            .acquire(&fx.ctx(true), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert!(prompter.asked.is_empty());
        assert!(result.used_local);
        assert!(!result.saved_to_cache);
        assert_eq!(dl.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_unattended_without_cache_downloads_and_saves() {
        let fx = Fixture::new();
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(None);
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::default();

        let result = acquirer
            .acquire(&fx.ctx(true), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert!(prompter.asked.is_empty());
        assert!(result.saved_to_cache);
    }

    #[tokio::test]
    async fn test_unknown_template_fails_before_any_io() {
        let fx = Fixture::new();
        let cache = fx.cache();
        let dl = downloader();
        let freshness = StubFreshness(None);
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::default();

        let err = acquirer
            .acquire(&fx.ctx(false), "acme/missing", "my-app", &mut prompter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TemplateNotFound(_)));
        assert_eq!(dl.calls.get(), 0);
        assert!(!fx.work.path().join("my-app").exists());
    }

    #[tokio::test]
    async fn test_download_failure_is_fatal_and_cleans_up() {
        let fx = Fixture::new();
        let cache = fx.cache();
        let dl = StubDownloader {
            fail: true,
            ..Default::default()
        };
        let freshness = StubFreshness(None);
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::default();

        let err = acquirer
            .acquire(&fx.ctx(false), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download { .. }));
        assert_eq!(dl.calls.get(), 1);
        assert!(prompter.asked.is_empty());
        assert!(!fx.work.path().join("my-app").exists());
    }

    #[tokio::test]
    async fn test_broken_cache_falls_back_to_download() {
        let fx = Fixture::new();
        let cache = fx.cache();
        let template = fx.registry.find("acme/tpl").unwrap();
        // A cache entry whose copy contains a dangling link cannot be restored
        std::fs::create_dir_all(cache.path_for(template)).unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(
            "/nonexistent/target",
            cache.path_for(template).join("dangling"),
        )
        .unwrap();
        #[cfg(not(unix))]
        return;

        let dl = downloader();
        let freshness = StubFreshness(None);
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::default();

        let result = acquirer
            .acquire(&fx.ctx(true), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert!(!result.used_local);
        assert_eq!(dl.calls.get(), 1);
        assert!(prompter.logged("Failed to use local copy"));
        assert!(result.project_dir.join("from-download.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_restore_into_existing_dir_still_downloads() {
        use crate::http;
        use crate::templates::download::tests::build_zip;
        use crate::templates::download::ArchiveDownloader;
        use httpmock::prelude::*;
        use url::Url;

        let fx = Fixture::new();
        let cache = fx.cache();
        let template = fx.registry.find("acme/tpl").unwrap();
        let cached = cache.path_for(template);
        std::fs::create_dir_all(cached.join("src")).unwrap();
        for i in 0..30 {
            std::fs::write(cached.join("src").join(format!("file{}.ts", i)), "cached").unwrap();
        }
        std::os::unix::fs::symlink("/nonexistent/target", cached.join("dangling")).unwrap();

        // The user created the project directory ahead of time
        let project_dir = fx.work.path().join("my-app");
        std::fs::create_dir_all(&project_dir).unwrap();

        let server = MockServer::start_async().await;
        let body = build_zip("tpl-HEAD", &[("README.md", "# tpl")]);
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/acme/tpl/archive/HEAD.zip");
                then.status(200).body(body.clone());
            })
            .await;
        let dl = ArchiveDownloader::new(
            Url::parse(&server.base_url()).unwrap(),
            http::client("create-reliverse-test"),
        );
        let freshness = StubFreshness(None);
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::default();

        let result = acquirer
            .acquire(&fx.ctx(true), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(!result.used_local);
        assert!(prompter.logged("Failed to use local copy"));
        assert_eq!(std::fs::read_to_string(project_dir.join("README.md")).unwrap(), "# tpl");
        assert!(!project_dir.join("src").exists());
    }

    #[tokio::test]
    async fn test_save_failure_is_logged_and_acquisition_succeeds() {
        let fx = Fixture::new();
        let cache = fx.cache();
        // A file where the author directory belongs makes the cache unwritable
        let root = fx.ctx(true).templates_dir();
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("acme"), "not a directory").unwrap();

        let dl = downloader();
        let freshness = StubFreshness(None);
        let acquirer = Acquirer {
            registry: &fx.registry,
            cache: &cache,
            freshness: &freshness,
            downloader: &dl,
        };
        let mut prompter = ScriptedPrompter::default();

        let result = acquirer
            .acquire(&fx.ctx(true), "acme/tpl", "my-app", &mut prompter)
            .await
            .unwrap();

        assert!(!result.saved_to_cache);
        assert!(!result.used_local);
        assert!(prompter.logged("Failed to save template"));
        assert!(result.project_dir.join("from-download.txt").exists());
    }
}
