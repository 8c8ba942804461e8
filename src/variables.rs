//! Named variables and `{name}` template substitution.

use anyhow::{Result, bail};
use std::collections::HashMap;

/// A set of named string variables used to fill in path and content templates.
///
/// Stores are plain values: [`VariableStore::branch_off`] copies the entries,
/// so a module's branch never leaks back into the base store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    map: HashMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a variable, failing if it was never set.
    pub fn get(&self, key: &str) -> Result<&str> {
        match self.map.get(key) {
            Some(value) => Ok(value),
            None => bail!("Error getting variable: \"{}\". It wasn't set anywhere.", key),
        }
    }

    pub fn get_safe(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    /// Insert every entry, overwriting existing keys.
    pub fn insert_all<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (k, v) in entries {
            self.map.insert(k.clone(), v.clone());
        }
    }

    /// Create a new store holding every current entry plus `extra`.
    /// Entries in `extra` win on collision; `self` is left untouched.
    pub fn branch_off<'a, I>(&self, extra: I) -> VariableStore
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut store = self.clone();
        store.insert_all(extra);
        store
    }

    /// Replace every `{name}` span whose name is a known variable.
    ///
    /// Unknown names, stray `}` and unterminated `{` are copied through
    /// verbatim. A `{` seen while already inside a brace abandons the outer
    /// attempt, so `{{var}}` becomes `{value}`.
    pub fn fill_in(&self, template: &str) -> String {
        let mut output = String::with_capacity(template.len());
        let mut name = String::new();
        let mut inside = false;

        for c in template.chars() {
            match c {
                '{' => {
                    if inside {
                        output.push('{');
                        output.push_str(&name);
                    }
                    name.clear();
                    inside = true;
                }
                '}' if inside => {
                    match self.map.get(&name) {
                        Some(value) => output.push_str(value),
                        None => {
                            output.push('{');
                            output.push_str(&name);
                            output.push('}');
                        }
                    }
                    name.clear();
                    inside = false;
                }
                _ if inside => name.push(c),
                _ => output.push(c),
            }
        }

        if inside {
            output.push('{');
            output.push_str(&name);
        }

        output
    }
}
