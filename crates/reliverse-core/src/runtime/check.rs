//! Package manager detection and dependency installation

use super::tool;
use anyhow::Result;
use std::fmt;
use std::path::Path;

/// JavaScript package managers, in detection order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Bun,
    Pnpm,
    Yarn,
    Npm,
}

impl PackageManager {
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Bun,
        PackageManager::Pnpm,
        PackageManager::Yarn,
        PackageManager::Npm,
    ];

    pub fn binary(&self) -> &'static str {
        match self {
            PackageManager::Bun => "bun",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Npm => "npm",
        }
    }

    /// Lockfiles that identify this package manager
    pub fn lockfiles(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Bun => &["bun.lockb", "bun.lock"],
            PackageManager::Pnpm => &["pnpm-lock.yaml"],
            PackageManager::Yarn => &["yarn.lock"],
            PackageManager::Npm => &["package-lock.json"],
        }
    }

    /// Command that runs a package binary without installing it globally
    pub fn dlx(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            PackageManager::Bun => ("bunx", &[]),
            PackageManager::Pnpm => ("pnpm", &["dlx"]),
            PackageManager::Yarn => ("yarn", &["dlx"]),
            PackageManager::Npm => ("npx", &[]),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary())
    }
}

/// Package manager implied by the lockfiles in `dir`
pub fn detect_from_lockfile(dir: &Path) -> Option<PackageManager> {
    PackageManager::ALL
        .into_iter()
        .find(|pm| pm.lockfiles().iter().any(|lock| dir.join(lock).is_file()))
}

/// Lockfile choice first, then the first installed manager, then npm
pub fn detect_package_manager(dir: &Path) -> PackageManager {
    detect_from_lockfile(dir)
        .or_else(|| {
            PackageManager::ALL
                .into_iter()
                .find(|pm| tool::is_installed(pm.binary()))
        })
        .unwrap_or(PackageManager::Npm)
}

/// Runtime detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

pub fn check_package_manager(pm: PackageManager) -> RuntimeInfo {
    let version = tool::get_version(pm.binary());
    RuntimeInfo {
        name: pm.binary(),
        available: version.is_some(),
        version,
    }
}

/// Run `<pm> install` in `dir`, streaming output
pub async fn install_dependencies(dir: &Path) -> Result<PackageManager> {
    let pm = detect_package_manager(dir);
    let info = check_package_manager(pm);
    if !info.available {
        anyhow::bail!(
            "{} is not installed. Install dependencies manually with: {} install",
            pm,
            pm
        );
    }
    tracing::debug!("Installing dependencies with {} {:?}", pm, info.version);
    tool::run_streaming(pm.binary(), &["install"], dir).await?;
    Ok(pm)
}
