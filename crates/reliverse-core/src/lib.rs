//! Reliverse Core - library behind the `create-reliverse` scaffolder
//!
//! This library creates web projects from remote templates and manages them
//! afterwards: placeholder replacement, i18n layout, `.env` composition,
//! dependency installation, GitHub publishing and Vercel deployment.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - template registry, cache, downloads,
//!   replacement, git and the GitHub/Vercel clients
//! - **Layer 2: Workflow Orchestration** - [`flow`] drives the create and
//!   manage flows through a [`Prompter`] and a [`RunContext`]
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use reliverse_core::templates::{TemplateCache, TemplateRegistry};
//!
//! let registry = TemplateRegistry::builtin();
//! let cache = TemplateCache::new(home.join(".reliverse/templates"));
//! for listing in reliverse_core::templates::list_with_cache_status(&registry, &cache).await {
//!     println!("{} cached={}", listing.template.id, listing.cached);
//! }
//! ```

pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod flow;
pub mod http;
pub mod menu;
pub mod product;
pub mod project;
pub mod prompt;
pub mod runtime;
pub mod templates;
pub mod version;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::ReliverseConfig;
pub use context::{DepsBehavior, RunContext, RunOptions};
pub use error::{is_cancelled, Error, Result};
pub use flow::{Command, CreateRequest, RunArgs, Toolkit};
pub use product::ProductConfig;
pub use prompt::{Prompter, SelectOption};
pub use templates::{Template, TemplateRegistry};

#[cfg(feature = "tui")]
pub use tui::run;
