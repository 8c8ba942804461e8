//! Package manager adapters.
//!
//! The engine only talks to [`Provider`]; how a provider maps packages to
//! commands for its package manager stays inside the adapter.

mod cargo;
mod pacman;
mod registry;

use anyhow::Result;
use async_trait::async_trait;

use crate::package::PackageInfo;

pub use cargo::CargoProvider;
pub use pacman::PacmanProvider;
pub use registry::ProviderRegistry;

/// One package manager.
///
/// `install` and `uninstall` report per-package command failures themselves
/// and keep going; an `Err` from any method aborts the sync.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique provider name, as used in module `packages` sections.
    fn name(&self) -> &str;

    /// Fail if the package manager is not usable on this machine.
    async fn check_installation(&self) -> Result<()>;

    async fn install(&self, packages: &[PackageInfo]) -> Result<()>;

    async fn uninstall(&self, packages: &[String]) -> Result<()>;

    /// Packages this provider currently manages, with their versions.
    async fn get_installed(&self) -> Result<Vec<PackageInfo>>;

    /// Update the named packages; an empty list means everything.
    async fn update(&self, packages: &[String]) -> Result<()>;
}
