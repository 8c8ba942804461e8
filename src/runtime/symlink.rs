//! Symlink operations (create, read, inspect, remove).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::symlink as unix_symlink;
            unix_symlink(original, link)
                .with_context(|| format!("Failed to link {:?} -> {:?}", link, original))?;
        }
        #[cfg(windows)]
        {
            use std::os::windows::fs::{symlink_dir, symlink_file};

            // Windows needs to know up front whether the target is a directory.
            if original.is_dir() {
                symlink_dir(original, link)
                    .with_context(|| format!("Failed to link {:?} -> {:?}", link, original))?;
            } else {
                symlink_file(original, link)
                    .with_context(|| format!("Failed to link {:?} -> {:?}", link, original))?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_link_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(path).with_context(|| format!("Failed to read symlink {:?}", path))
    }

    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_symlink_impl(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            fs::remove_file(path).with_context(|| format!("Failed to remove symlink {:?}", path))?;
        }
        #[cfg(windows)]
        {
            // Directory symlinks need remove_dir on Windows.
            fs::remove_dir(path)
                .or_else(|_| fs::remove_file(path))
                .with_context(|| format!("Failed to remove symlink {:?}", path))?;
        }
        Ok(())
    }
}
