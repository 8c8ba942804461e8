//! File system operations (read, write, directory).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self, contents))]
    pub(crate) fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn rename_impl(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).with_context(|| format!("Failed to rename {:?} to {:?}", from, to))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn copy_impl(&self, from: &Path, to: &Path) -> Result<u64> {
        fs::copy(from, to).with_context(|| format!("Failed to copy {:?} to {:?}", from, to))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("Failed to create directory {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_file_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("Failed to remove file {:?}", path))
    }

    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }

    pub(crate) fn is_file_impl(&self, path: &Path) -> bool {
        path.is_file()
    }
}
