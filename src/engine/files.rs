//! Placing module files and directories on disk.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::filesystem::Filesystem;
use crate::module::{FileSource, Module};
use crate::runtime::absolutize;
use crate::variables::VariableStore;

/// Resolve a link source against the dotfiles root, then fill it in.
fn resolve_source(store: &VariableStore, dotfiles_root: &Path, source: &str) -> PathBuf {
    let absolute = absolutize(dotfiles_root, Path::new(source));
    PathBuf::from(store.fill_in(&absolute.to_string_lossy()))
}

/// Sync every module's files, then its directories, module by module in order.
///
/// Each module sees the global store overlaid with its own variables;
/// nothing a module sets leaks into the next one.
#[tracing::instrument(skip_all)]
pub fn sync_files(
    modules: &[Module],
    store: &VariableStore,
    filesystem: &dyn Filesystem,
    dotfiles_root: &Path,
) -> Result<()> {
    for module in modules {
        let module_store = store.branch_off(&module.variables);

        for (destination, source) in &module.files {
            let destination = PathBuf::from(module_store.fill_in(destination));
            match source {
                FileSource::Link(path) => {
                    let source = resolve_source(&module_store, dotfiles_root, path);
                    filesystem
                        .ensure_symlink(&destination, &source)
                        .with_context(|| format!("Failed to link file {:?} in module {}", destination, module.name))?;
                    println!("Linked file: {} -> {}", source.display(), destination.display());
                }
                FileSource::Generated(generate) => {
                    let contents = generate(&module_store)
                        .with_context(|| format!("Failed to generate {:?} in module {}", destination, module.name))?;
                    filesystem.write_file(&destination, &contents)?;
                    println!("Generated: {}", destination.display());
                }
            }
        }

        for (destination, source) in &module.directories {
            let destination = PathBuf::from(module_store.fill_in(destination));
            let source = resolve_source(&module_store, dotfiles_root, source);
            filesystem
                .ensure_symlink(&destination, &source)
                .with_context(|| format!("Failed to link directory {:?} in module {}", destination, module.name))?;
            println!("Linked directory: {} -> {}", source.display(), destination.display());
        }
    }
    Ok(())
}
