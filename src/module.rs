//! Module declarations: the unit of desired state.

use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::variables::VariableStore;

/// Produces file contents from the module's variable store.
pub type Generator = Arc<dyn Fn(&VariableStore) -> Result<String> + Send + Sync>;

/// Where a declared file's contents come from.
#[derive(Clone)]
pub enum FileSource {
    /// Path relative to the dotfiles root; the destination becomes a symlink to it.
    Link(String),
    /// Contents generated at sync time and written as a regular file.
    Generated(Generator),
}

impl FileSource {
    pub fn link(path: impl Into<String>) -> Self {
        FileSource::Link(path.into())
    }

    pub fn generated<F>(f: F) -> Self
    where
        F: Fn(&VariableStore) -> Result<String> + Send + Sync + 'static,
    {
        FileSource::Generated(Arc::new(f))
    }

    /// A generator that fills `template` in with the module's variables.
    pub fn template(template: impl Into<String>) -> Self {
        let template = template.into();
        Self::generated(move |store| Ok(store.fill_in(&template)))
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Link(path) => f.debug_tuple("Link").field(path).finish(),
            FileSource::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

/// A named bundle of variables, package requests and file placements.
///
/// All list-shaped fields keep declaration order, which is the order the
/// engine processes them in.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub variables: HashMap<String, String>,
    /// Provider name to package specs (`"name"` or `"name:version"`).
    pub packages: Vec<(String, Vec<String>)>,
    /// Destination template to source path relative to the dotfiles root.
    pub directories: Vec<(String, String)>,
    /// Destination template to file source.
    pub files: Vec<(String, FileSource)>,
    /// Shell commands run after every package sync.
    pub on_every_sync: Vec<String>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_packages(mut self, provider: impl Into<String>, specs: &[&str]) -> Self {
        self.packages.push((
            provider.into(),
            specs.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn with_file(mut self, destination: impl Into<String>, source: FileSource) -> Self {
        self.files.push((destination.into(), source));
        self
    }

    pub fn with_directory(
        mut self,
        destination: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.directories.push((destination.into(), source.into()));
        self
    }

    pub fn with_hook(mut self, command: impl Into<String>) -> Self {
        self.on_every_sync.push(command.into());
        self
    }
}
