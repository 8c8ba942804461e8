//! Diffing requested packages against what each provider has installed.

use anyhow::{Context, Result};
use log::warn;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::package::{Lockfile, PackageInfo, PackageSet};
use crate::provider::Provider;

/// What one provider needs to do to match the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagePlan {
    pub provider: String,
    pub no_change: Vec<PackageInfo>,
    pub to_install: Vec<PackageInfo>,
    /// Installed but no longer requested. Always empty with `no_remove`.
    pub to_uninstall: Vec<PackageInfo>,
}

impl PackagePlan {
    /// True if there is nothing to install or uninstall.
    pub fn is_empty(&self) -> bool {
        self.to_install.is_empty() && self.to_uninstall.is_empty()
    }

    pub fn uninstall_names(&self) -> Vec<String> {
        self.to_uninstall.iter().map(|p| p.name.clone()).collect()
    }
}

/// Classify requested and installed packages for one provider.
///
/// A request is satisfied by an exact installed match, or by any installed
/// version when it is unpinned. Installed packages whose name is not
/// requested at all are uninstalled unless `no_remove` is set.
pub fn plan_packages(
    provider: &str,
    requested: &[PackageInfo],
    installed: &[PackageInfo],
    no_remove: bool,
) -> PackagePlan {
    let installed_set = PackageSet::from_packages(installed);
    let requested_set = PackageSet::from_packages(requested);

    let mut plan = PackagePlan {
        provider: provider.to_string(),
        ..Default::default()
    };

    for p in requested {
        if installed_set.has(p)
            || (p.is_any_version() && installed_set.has_any_version(&p.provider, &p.name))
        {
            plan.no_change.push(p.clone());
        } else {
            plan.to_install.push(p.clone());
        }
    }

    if !no_remove {
        plan.to_uninstall = installed
            .iter()
            .filter(|p| !requested_set.has_any_version(&p.provider, &p.name))
            .cloned()
            .collect();
    }

    plan
}

/// Bring every provider in line with its requested packages.
///
/// Providers run one after another. A provider without a request group is
/// treated as having nothing requested.
#[tracing::instrument(skip_all, fields(no_remove))]
pub async fn sync_packages(
    requested: &BTreeMap<String, Vec<PackageInfo>>,
    providers: &[Arc<dyn Provider>],
    no_remove: bool,
) -> Result<Vec<PackagePlan>> {
    for name in requested.keys() {
        if !providers.iter().any(|p| p.name() == name) {
            warn!("Packages requested for provider {}, which is not loaded", name);
        }
    }

    let mut plans = Vec::with_capacity(providers.len());
    for provider in providers {
        let name = provider.name();
        let packages = requested.get(name).map(Vec::as_slice).unwrap_or_default();

        let installed = provider
            .get_installed()
            .await
            .with_context(|| format!("Failed to list installed packages for {}", name))?;
        let plan = plan_packages(name, packages, &installed, no_remove);

        println!("  MANAGING PACKAGES FOR: {}", name);
        for p in &plan.no_change {
            println!("    OK: {}", p);
        }
        for p in &plan.to_install {
            println!("    INSTALLING: {}", p);
        }
        for p in &plan.to_uninstall {
            println!("    REMOVING: {}", p);
        }

        provider
            .install(&plan.to_install)
            .await
            .with_context(|| format!("{} failed to install packages", name))?;
        if !no_remove {
            provider
                .uninstall(&plan.uninstall_names())
                .await
                .with_context(|| format!("{} failed to uninstall packages", name))?;
        }

        plans.push(plan);
    }

    Ok(plans)
}

/// Record every provider's currently installed versions in the lockfile.
#[tracing::instrument(skip_all)]
pub async fn update_lockfile(providers: &[Arc<dyn Provider>], lockfile: &mut Lockfile) -> Result<()> {
    for provider in providers {
        let installed = provider
            .get_installed()
            .await
            .with_context(|| format!("Failed to list installed packages for {}", provider.name()))?;
        for p in installed {
            lockfile.set_version(&p.provider, &p.name, &p.version);
        }
    }
    Ok(())
}
