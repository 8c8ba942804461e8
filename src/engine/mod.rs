//! Reconciliation engine: files, packages, hooks and the lockfile.

mod files;
mod packages;
mod reconcile;

pub use files::sync_files;
pub use packages::{get_package_list, group_by_provider};
pub use reconcile::{PackagePlan, plan_packages, sync_packages, update_lockfile};

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;

use crate::filesystem::Filesystem;
use crate::module::Module;
use crate::package::Lockfile;
use crate::provider::Provider;
use crate::runtime::Runtime;
use crate::shell::{RunOptions, Shell};
use crate::variables::VariableStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Never uninstall packages.
    pub no_remove: bool,
    /// Stop after syncing files.
    pub files_only: bool,
    /// Leave the lockfile on disk untouched.
    pub dry_run: bool,
}

/// Everything a sync run reads from or acts through.
pub struct SyncContext<'a, R: Runtime> {
    pub runtime: &'a R,
    pub modules: &'a [Module],
    pub providers: &'a [Arc<dyn Provider>],
    pub store: &'a VariableStore,
    pub filesystem: &'a dyn Filesystem,
    pub shell: &'a dyn Shell,
    pub dotfiles_root: &'a Path,
    pub lockfile_path: &'a Path,
}

/// Fail on the first provider whose tool is not usable.
pub async fn check_providers(providers: &[Arc<dyn Provider>]) -> Result<()> {
    for provider in providers {
        provider.check_installation().await.map_err(|e| {
            anyhow!(
                "{} failed when checking its own installation: {:#}",
                provider.name(),
                e
            )
        })?;
    }
    Ok(())
}

/// Run every module's `on_every_sync` commands, module by module.
#[tracing::instrument(skip_all)]
pub async fn run_hooks(modules: &[Module], shell: &dyn Shell) -> Result<()> {
    for module in modules {
        for command in &module.on_every_sync {
            println!("  {}: {}", module.name, command);
            shell
                .run(command, RunOptions { check: true, ..RunOptions::displayed() })
                .await
                .with_context(|| format!("Hook for module {} failed", module.name))?;
        }
    }
    Ok(())
}

/// One full sync run. The lockfile is saved only if every step succeeds,
/// and never on a dry run.
#[tracing::instrument(skip_all, fields(modules = ctx.modules.len(), providers = ctx.providers.len()))]
pub async fn sync_modules<R: Runtime>(
    ctx: &SyncContext<'_, R>,
    lockfile: &mut Lockfile,
    options: SyncOptions,
) -> Result<Vec<PackagePlan>> {
    check_providers(ctx.providers).await?;

    println!("\nSYNCING FILES:");
    sync_files(ctx.modules, ctx.store, ctx.filesystem, ctx.dotfiles_root)?;

    if options.files_only {
        return Ok(Vec::new());
    }

    let requested = group_by_provider(get_package_list(ctx.modules, lockfile)?);

    println!("\nSYNCING PACKAGES:");
    let plans = sync_packages(&requested, ctx.providers, options.no_remove).await?;

    println!("\nRUNNING EVENTS:");
    run_hooks(ctx.modules, ctx.shell).await?;

    update_lockfile(ctx.providers, lockfile).await?;
    if !options.dry_run {
        lockfile.serialize_to_file(ctx.runtime, ctx.lockfile_path)?;
    }

    Ok(plans)
}
