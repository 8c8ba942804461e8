use anyhow::{Result, bail};
use std::path::PathBuf;
use std::sync::Arc;

use super::paths::resolve_root;
use crate::config::{ConfigFile, DOTFILES_DIR, LOCKFILE_NAME, load_config};
use crate::provider::{Provider, ProviderRegistry};
use crate::runtime::Runtime;
use crate::shell::{DryShell, Shell, SystemShell};

/// Everything a command needs: the runtime, the resolved root and its config.
pub struct Config<R: Runtime> {
    pub runtime: R,
    pub root: PathBuf,
    pub file: ConfigFile,
}

impl<R: Runtime> Config<R> {
    pub fn load(runtime: R, root: Option<PathBuf>) -> Result<Self> {
        let root = resolve_root(&runtime, root)?;
        let file = load_config(&runtime, &root)?;
        Ok(Self {
            runtime,
            root,
            file,
        })
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(LOCKFILE_NAME)
    }

    pub fn dotfiles_root(&self) -> PathBuf {
        self.root.join(DOTFILES_DIR)
    }
}

/// The shell mutating commands go through.
pub fn shell_for(dry_run: bool) -> Arc<dyn Shell> {
    if dry_run {
        Arc::new(DryShell)
    } else {
        Arc::new(SystemShell)
    }
}

/// Resolve the configured providers, in config order.
pub fn configured_providers(file: &ConfigFile, shell: Arc<dyn Shell>) -> Result<Vec<Arc<dyn Provider>>> {
    ProviderRegistry::builtin(shell).resolve(&file.providers)
}

/// All providers, or only the one named. An unknown name is an error.
pub fn select_providers<'a>(
    providers: &'a [Arc<dyn Provider>],
    name: Option<&str>,
) -> Result<Vec<&'a Arc<dyn Provider>>> {
    let Some(name) = name else {
        return Ok(providers.iter().collect());
    };
    match providers.iter().find(|p| p.name() == name) {
        Some(provider) => Ok(vec![provider]),
        None => bail!("Provider {} was not found.", name),
    }
}
