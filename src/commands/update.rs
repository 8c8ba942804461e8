use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::sync::Arc;

use super::config::{Config, configured_providers, select_providers, shell_for};
use crate::engine::update_lockfile;
use crate::package::Lockfile;
use crate::provider::Provider;
use crate::runtime::Runtime;

/// Update packages through the configured providers, then refresh the lockfile.
///
/// With no packages named, each selected provider updates everything it manages.
#[tracing::instrument(skip(runtime, root))]
pub async fn update<R: Runtime>(
    runtime: R,
    root: Option<PathBuf>,
    provider: Option<String>,
    packages: Vec<String>,
    dry_run: bool,
) -> Result<()> {
    if provider.is_none() && !packages.is_empty() {
        bail!("Name a provider to update specific packages");
    }

    let config = Config::load(runtime, root)?;
    let providers = configured_providers(&config.file, shell_for(dry_run))?;
    let selected: Vec<Arc<dyn Provider>> = select_providers(&providers, provider.as_deref())?
        .into_iter()
        .cloned()
        .collect();

    run_updates(&selected, &packages).await?;

    if dry_run {
        return Ok(());
    }
    let lockfile_path = config.lockfile_path();
    let mut lockfile = Lockfile::load(&config.runtime, &lockfile_path)?;
    update_lockfile(&selected, &mut lockfile).await?;
    lockfile.serialize_to_file(&config.runtime, &lockfile_path)
}

async fn run_updates(providers: &[Arc<dyn Provider>], packages: &[String]) -> Result<()> {
    for provider in providers {
        println!("Updating packages for {}:", provider.name());
        provider
            .update(packages)
            .await
            .with_context(|| format!("{} failed to update packages", provider.name()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use crate::runtime::MockRuntime;

    #[tokio::test]
    async fn test_run_updates_passes_names_through() {
        let mut mock = MockProvider::new();
        mock.expect_name().return_const("cargo".to_string());
        mock.expect_update()
            .withf(|names: &[String]| names == ["bat".to_string()])
            .times(1)
            .returning(|_| Ok(()));
        let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(mock)];

        run_updates(&providers, &["bat".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_updates_error_names_provider() {
        let mut mock = MockProvider::new();
        mock.expect_name().return_const("cargo".to_string());
        mock.expect_update()
            .returning(|_| Err(anyhow::anyhow!("boom")));
        let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(mock)];

        let err = run_updates(&providers, &[]).await.unwrap_err();
        assert!(err.to_string().contains("cargo failed to update packages"));
    }

    #[tokio::test]
    async fn test_packages_without_provider_is_rejected() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().never();

        let err = update(runtime, None, None, vec!["bat".to_string()], false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Name a provider"));
    }
}
