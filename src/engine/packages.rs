//! Consolidating module package requests into one list.

use anyhow::{Result, bail};
use std::collections::{BTreeMap, HashMap};

use crate::module::Module;
use crate::package::{ANY_VERSION, Lockfile, PackageInfo, split_spec, version_matches};

/// Turn every module's package specs into [`PackageInfo`]s.
///
/// Specs without a version take the lockfile's pin, or [`ANY_VERSION`]
/// when there is none. The first module to request a `(provider, name)`
/// is remembered; a later request whose version matches it is rejected
/// as a conflict naming both modules.
#[tracing::instrument(skip_all)]
pub fn get_package_list(modules: &[Module], lockfile: &Lockfile) -> Result<Vec<PackageInfo>> {
    let mut all = Vec::new();
    // (provider, name) -> (module, version)
    let mut seen: HashMap<(String, String), (String, String)> = HashMap::new();

    for module in modules {
        for (provider, specs) in &module.packages {
            for spec in specs {
                let (name, version) = split_spec(spec);
                let version = match version {
                    Some(v) => v.to_string(),
                    None => lockfile
                        .get_version(provider, name)
                        .unwrap_or(ANY_VERSION)
                        .to_string(),
                };
                let package = PackageInfo::new(name, version, provider.as_str());

                let key = (package.provider.clone(), package.name.clone());
                if let Some((seen_module, seen_version)) = seen.get(&key) {
                    if version_matches(seen_version, &package.version) {
                        bail!(
                            "Requested two different versions for package {}: {} in {} and {} in {}",
                            package.name,
                            seen_version,
                            seen_module,
                            package.version,
                            module.name
                        );
                    }
                } else {
                    seen.insert(key, (module.name.clone(), package.version.clone()));
                }

                all.push(package);
            }
        }
    }

    Ok(all)
}

/// Group packages by provider, keeping request order within each group.
pub fn group_by_provider(packages: Vec<PackageInfo>) -> BTreeMap<String, Vec<PackageInfo>> {
    let mut grouped: BTreeMap<String, Vec<PackageInfo>> = BTreeMap::new();
    for package in packages {
        grouped
            .entry(package.provider.clone())
            .or_default()
            .push(package);
    }
    grouped
}
