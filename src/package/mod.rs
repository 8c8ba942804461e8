//! Package identity, requested-package specs and installed-version tracking.

mod lockfile;
mod set;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use lockfile::{Lockfile, LockfileData};
pub use set::PackageSet;

/// Version sentinel meaning "unpinned, accept whatever is installed".
pub const ANY_VERSION: &str = "_*_";

/// A package as seen by the engine: a name at a version from one provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub provider: String,
}

impl PackageInfo {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            provider: provider.into(),
        }
    }

    pub fn is_any_version(&self) -> bool {
        self.version == ANY_VERSION
    }
}

impl fmt::Display for PackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// Split a module package spec into name and explicit version.
///
/// `"name"` yields no version; `"name:version"` splits on the first colon
/// only, so versions may themselves contain colons.
pub fn split_spec(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once(':') {
        Some((name, version)) => (name, Some(version)),
        None => (spec, None),
    }
}

/// True if either side is unpinned or both name the same version.
pub fn version_matches(a: &str, b: &str) -> bool {
    a == ANY_VERSION || b == ANY_VERSION || a == b
}
