//! Filesystem collaborator used by the file syncer.
//!
//! [`RuntimeFilesystem`] implements the placement policy on top of a
//! [`Runtime`]. Its [`SyncMode`] decides what happens when something is
//! already at a destination: replace it, log only, or ask first.

use anyhow::{Result, bail};
use log::debug;
use std::path::Path;

use crate::runtime::Runtime;

#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Write `contents` to `path`, creating parents and replacing an existing file.
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// True if anything, including a dangling symlink, is at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Make `destination` a symlink to `source`.
    ///
    /// A symlink already pointing at `source` is left alone. Existing regular
    /// files and other symlinks are replaced; anything else is an error.
    fn ensure_symlink(&self, destination: &Path, source: &Path) -> Result<()>;

    /// Copy `source` to `destination`, creating parents.
    fn copy(&self, source: &Path, destination: &Path) -> Result<()>;
}

/// How existing destinations are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Replace existing files without asking.
    #[default]
    Normal,
    /// Print what would happen and change nothing.
    DryRun,
    /// Ask y/N before replacing anything.
    Confirm,
}

pub struct RuntimeFilesystem<R: Runtime> {
    runtime: R,
    mode: SyncMode,
}

/// What is currently at a destination path.
enum Existing {
    Nothing,
    Symlink,
    File,
    Other,
}

impl<R: Runtime> RuntimeFilesystem<R> {
    pub fn new(runtime: R, mode: SyncMode) -> Self {
        Self { runtime, mode }
    }

    fn inspect(&self, path: &Path) -> Existing {
        if self.runtime.is_symlink(path) {
            Existing::Symlink
        } else if self.runtime.is_file(path) {
            Existing::File
        } else if self.runtime.exists(path) {
            Existing::Other
        } else {
            Existing::Nothing
        }
    }

    fn ensure_parent(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Clear the way for a new entry at `path`.
    ///
    /// Returns false when the user declined in confirm mode.
    fn clear(&self, path: &Path, existing: &Existing, question: &str) -> Result<bool> {
        if self.mode == SyncMode::Confirm && !self.runtime.confirm(question)? {
            return Ok(false);
        }
        match existing {
            Existing::Symlink => self.runtime.remove_symlink(path)?,
            Existing::File => self.runtime.remove_file(path)?,
            Existing::Nothing => {}
            Existing::Other => bail!(
                "{:?} exists but is neither a file nor a symlink. Resolve it manually and sync again",
                path
            ),
        }
        Ok(true)
    }
}

impl<R: Runtime> Filesystem for RuntimeFilesystem<R> {
    #[tracing::instrument(skip(self, contents))]
    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        if self.mode == SyncMode::DryRun {
            println!("Would be writing to {}", path.display());
            return Ok(());
        }

        self.ensure_parent(path)?;

        let existing = self.inspect(path);
        if !matches!(existing, Existing::Nothing) {
            let question = format!(
                "File {} already exists. Delete it to write new content?",
                path.display()
            );
            if !self.clear(path, &existing, &question)? {
                println!("Write operation cancelled.");
                return Ok(());
            }
        }

        self.runtime.write(path, contents.as_bytes())
    }

    fn exists(&self, path: &Path) -> bool {
        self.runtime.exists(path) || self.runtime.is_symlink(path)
    }

    #[tracing::instrument(skip(self))]
    fn ensure_symlink(&self, destination: &Path, source: &Path) -> Result<()> {
        let existing = self.inspect(destination);

        match existing {
            Existing::Other => bail!(
                "Neither file nor link present in {:?}. Something is probably not right, resolve it manually",
                destination
            ),
            Existing::Symlink => {
                if let Ok(target) = self.runtime.read_link(destination)
                    && target == source
                {
                    debug!("{:?} already links to {:?}", destination, source);
                    return Ok(());
                }
            }
            Existing::File | Existing::Nothing => {}
        }

        if self.mode == SyncMode::DryRun {
            println!(
                "Would create symlink {} -> {}",
                source.display(),
                destination.display()
            );
            return Ok(());
        }

        if !matches!(existing, Existing::Nothing) {
            let question = format!(
                "File or symlink {} already exists. Delete it to create new symlink?",
                destination.display()
            );
            if !self.clear(destination, &existing, &question)? {
                println!("Symlink operation cancelled.");
                return Ok(());
            }
        }

        self.ensure_parent(destination)?;
        self.runtime.symlink(source, destination)
    }

    #[tracing::instrument(skip(self))]
    fn copy(&self, source: &Path, destination: &Path) -> Result<()> {
        if self.mode == SyncMode::DryRun {
            println!(
                "Would be copying {} -> {}",
                source.display(),
                destination.display()
            );
            return Ok(());
        }

        self.ensure_parent(destination)?;

        let existing = self.inspect(destination);
        if !matches!(existing, Existing::Nothing) {
            let question = format!(
                "File {} already exists. Delete it to copy new content?",
                destination.display()
            );
            if !self.clear(destination, &existing, &question)? {
                println!("Copy operation cancelled.");
                return Ok(());
            }
        }

        self.runtime.copy(source, destination)?;
        Ok(())
    }
}
