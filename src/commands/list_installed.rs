use anyhow::Result;
use std::path::PathBuf;

use super::config::{Config, configured_providers, select_providers, shell_for};
use crate::provider::Provider;
use crate::runtime::Runtime;

/// Print `name@version` for every package a provider reports installed.
#[tracing::instrument(skip(runtime, root))]
pub async fn list_installed<R: Runtime>(runtime: R, root: Option<PathBuf>, provider: Option<String>) -> Result<()> {
    let config = Config::load(runtime, root)?;
    let providers = configured_providers(&config.file, shell_for(false))?;
    let selected = select_providers(&providers, provider.as_deref())?;

    for provider in selected {
        println!("Currently installed packages for {}:", provider.name());
        for line in installed_lines(provider.as_ref()).await? {
            println!("  {}", line);
        }
    }
    Ok(())
}

async fn installed_lines(provider: &dyn Provider) -> Result<Vec<String>> {
    let packages = provider.get_installed().await?;
    Ok(packages
        .into_iter()
        .map(|p| format!("{}@{}", p.name, p.version))
        .collect())
}
