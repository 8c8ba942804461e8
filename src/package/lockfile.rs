use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use crate::runtime::Runtime;

/// On-disk shape: `{ provider: { package: version } }`.
pub type LockfileData = BTreeMap<String, BTreeMap<String, String>>;

/// Last observed installed version per provider and package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    data: LockfileData,
}

impl Lockfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &LockfileData {
        &self.data
    }

    pub fn get_version(&self, provider: &str, name: &str) -> Option<&str> {
        self.data
            .get(provider)
            .and_then(|packages| packages.get(name))
            .map(String::as_str)
    }

    pub fn set_version(&mut self, provider: &str, name: &str, version: &str) {
        self.data
            .entry(provider.to_string())
            .or_default()
            .insert(name.to_string(), version.to_string());
    }

    pub fn delete(&mut self, provider: &str, name: &str) {
        if let Some(packages) = self.data.get_mut(provider) {
            packages.remove(name);
        }
    }

    /// Write the whole lockfile as one JSON snapshot.
    ///
    /// The snapshot goes to a sibling temp file first and is renamed into
    /// place, so the target never holds a partial write.
    #[tracing::instrument(skip(self, runtime))]
    pub fn serialize_to_file<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !runtime.exists(parent)
        {
            runtime.create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        runtime
            .write(&tmp, json.as_bytes())
            .with_context(|| format!("Failed to write lockfile to {:?}", tmp))?;
        runtime
            .rename(&tmp, path)
            .with_context(|| format!("Failed to move lockfile into place at {:?}", path))?;

        log::debug!("Wrote lockfile {:?}", path);
        Ok(())
    }

    /// Replace the in-memory data with the file's contents.
    ///
    /// A missing file leaves the lockfile empty; an unreadable or malformed
    /// one is an error.
    #[tracing::instrument(skip(self, runtime))]
    pub fn read_from_file<R: Runtime>(&mut self, runtime: &R, path: &Path) -> Result<()> {
        if !runtime.exists(path) {
            log::info!("No lockfile at {:?}, starting empty", path);
            self.data.clear();
            return Ok(());
        }

        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read lockfile from {:?}", path))?;
        self.data = serde_json::from_str(&content)
            .with_context(|| format!("Failed to read lockfile from {:?}", path))?;
        Ok(())
    }

    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let mut lockfile = Self::new();
        lockfile.read_from_file(runtime, path)?;
        Ok(lockfile)
    }
}
