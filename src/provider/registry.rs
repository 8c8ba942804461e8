//! Compiled-in table of providers, looked up by name.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};

use super::{CargoProvider, PacmanProvider, Provider};
use crate::shell::{Shell, SystemShell};

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry holding every built-in provider.
    ///
    /// Mutating commands go through `run`, which may be a dry shell;
    /// installed-package queries always use the real shell.
    pub fn builtin(run: Arc<dyn Shell>) -> Self {
        let query: Arc<dyn Shell> = Arc::new(SystemShell);
        let mut registry = Self::new();
        registry.register(Arc::new(CargoProvider::new(run.clone(), query.clone())));
        registry.register(Arc::new(PacmanProvider::new(run.clone(), query.clone())));
        registry.register(Arc::new(PacmanProvider::yay(run, query)));
        registry
    }

    /// Register a provider under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up every name in order. Any unknown name is an error.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Arc<dyn Provider>>> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            match self.providers.get(name) {
                Some(provider) => resolved.push(provider.clone()),
                None => bail!(
                    "Provider {} was not found. Available providers: {}",
                    name,
                    self.names().join(", ")
                ),
            }
        }
        Ok(resolved)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
