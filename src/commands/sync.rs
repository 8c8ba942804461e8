use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use super::config::{Config, configured_providers, shell_for};
use crate::config::{base_variables, load_modules};
use crate::engine::{SyncContext, SyncOptions, sync_modules};
use crate::filesystem::{RuntimeFilesystem, SyncMode};
use crate::package::Lockfile;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncFlags {
    pub dry_run: bool,
    pub safe: bool,
    pub files_only: bool,
    pub confirm: bool,
}

impl SyncFlags {
    fn mode(&self) -> SyncMode {
        if self.dry_run {
            SyncMode::DryRun
        } else if self.confirm {
            SyncMode::Confirm
        } else {
            SyncMode::Normal
        }
    }
}

/// Load everything under the root and run a full sync.
#[tracing::instrument(skip(runtime, root))]
pub async fn sync<R: Runtime + Clone>(runtime: R, root: Option<PathBuf>, flags: SyncFlags) -> Result<()> {
    let config = Config::load(runtime.clone(), root)?;
    let modules = load_modules(&config.runtime, &config.root, &config.file.modules)?;
    let store = base_variables(&config.runtime, &config.root, &config.file)?;

    let shell = shell_for(flags.dry_run);
    let providers = configured_providers(&config.file, shell.clone())?;

    let lockfile_path = config.lockfile_path();
    let mut lockfile = Lockfile::load(&config.runtime, &lockfile_path)?;
    let filesystem = RuntimeFilesystem::new(runtime, flags.mode());
    let dotfiles_root = config.dotfiles_root();

    debug!(
        "Syncing {} module(s) with {} provider(s)",
        modules.len(),
        providers.len()
    );

    let ctx = SyncContext {
        runtime: &config.runtime,
        modules: &modules,
        providers: &providers,
        store: &store,
        filesystem: &filesystem,
        shell: shell.as_ref(),
        dotfiles_root: &dotfiles_root,
        lockfile_path: &lockfile_path,
    };
    let options = SyncOptions {
        no_remove: flags.safe,
        files_only: flags.files_only,
        dry_run: flags.dry_run,
    };

    let plans = sync_modules(&ctx, &mut lockfile, options).await?;
    if !flags.files_only {
        let installed: usize = plans.iter().map(|p| p.to_install.len()).sum();
        let removed: usize = plans.iter().map(|p| p.to_uninstall.len()).sum();
        println!("\nDone: {} to install, {} to remove", installed, removed);
    }
    Ok(())
}
