use std::collections::HashSet;

use super::PackageInfo;

/// Membership index over `(provider, name, version)` triples.
///
/// Every exact entry also registers its `(provider, name)` key, so
/// `has(p)` always implies `has_any_version(p)`.
#[derive(Debug, Default)]
pub struct PackageSet {
    packages: HashSet<(String, String, String)>,
    keys: HashSet<(String, String)>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_packages<'a>(packages: impl IntoIterator<Item = &'a PackageInfo>) -> Self {
        let mut set = Self::new();
        set.add_list(packages);
        set
    }

    pub fn add(&mut self, pkg: &PackageInfo) {
        self.packages.insert((
            pkg.provider.clone(),
            pkg.name.clone(),
            pkg.version.clone(),
        ));
        self.keys.insert((pkg.provider.clone(), pkg.name.clone()));
    }

    pub fn add_list<'a>(&mut self, packages: impl IntoIterator<Item = &'a PackageInfo>) {
        for pkg in packages {
            self.add(pkg);
        }
    }

    /// Exact provider, name and version match.
    pub fn has(&self, pkg: &PackageInfo) -> bool {
        self.packages.contains(&(
            pkg.provider.clone(),
            pkg.name.clone(),
            pkg.version.clone(),
        ))
    }

    /// Any version of `name` from `provider`.
    pub fn has_any_version(&self, provider: &str, name: &str) -> bool {
        self.keys.contains(&(provider.to_string(), name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
