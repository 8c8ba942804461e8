use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use super::config::{Config, configured_providers, shell_for};
use crate::provider::Provider;
use crate::runtime::Runtime;

/// Check every configured provider and report each result.
#[tracing::instrument(skip(runtime, root))]
pub async fn providers<R: Runtime>(runtime: R, root: Option<PathBuf>) -> Result<()> {
    let config = Config::load(runtime, root)?;
    let providers = configured_providers(&config.file, shell_for(false))?;

    if providers.is_empty() {
        println!("No providers configured.");
        return Ok(());
    }

    for line in check_all(&providers).await {
        println!("{}", line);
    }
    Ok(())
}

pub(crate) async fn check_all(providers: &[Arc<dyn Provider>]) -> Vec<String> {
    let mut lines = Vec::with_capacity(providers.len());
    for provider in providers {
        let line = match provider.check_installation().await {
            Ok(()) => format!("{} is installed correctly", provider.name()),
            Err(e) => format!(
                "{} failed when checking its own installation: {:#}",
                provider.name(),
                e
            ),
        };
        lines.push(line);
    }
    lines
}
