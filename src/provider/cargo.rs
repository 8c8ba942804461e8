//! `cargo install` provider for Rust binaries.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};

use super::Provider;
use crate::package::PackageInfo;
use crate::shell::{RunOptions, Shell};

const NAME: &str = "cargo";

/// Concurrent `cargo install` processes; cargo serializes on its own lock past this.
const MAX_PARALLEL: usize = 4;

pub struct CargoProvider {
    run: Arc<dyn Shell>,
    query: Arc<dyn Shell>,
}

impl CargoProvider {
    pub fn new(run: Arc<dyn Shell>, query: Arc<dyn Shell>) -> Self {
        Self { run, query }
    }

    fn install_command(pkg: &PackageInfo) -> String {
        if pkg.is_any_version() {
            format!("cargo install {}", pkg.name)
        } else {
            format!("cargo install {} --version {}", pkg.name, pkg.version)
        }
    }

    /// Run `commands` on the mutating shell, at most [`MAX_PARALLEL`] at a time.
    /// Failures are reported and do not stop the remaining commands.
    async fn run_all(&self, commands: Vec<String>, action: &str) {
        let results: Vec<(String, Result<i32>)> = stream::iter(commands)
            .map(|command| async move {
                let result = self
                    .run
                    .run(&command, RunOptions::default())
                    .await
                    .map(|out| out.code);
                (command, result)
            })
            .buffer_unordered(MAX_PARALLEL)
            .collect()
            .await;

        for (command, result) in results {
            match result {
                Ok(0) => info!("{} succeeded: {}", action, command),
                Ok(code) => {
                    println!("Error {} with `{}` (exit code {}). See the logs above", action, command, code)
                }
                Err(e) => {
                    warn!("{} failed: {}: {:#}", action, command, e);
                    println!("Error {} with `{}`: {:#}", action, command, e);
                }
            }
        }
    }
}

/// Parse `cargo install --list` output.
///
/// Package lines look like `ripgrep v14.1.0:`; the indented lines under
/// them list binaries and are skipped.
pub(crate) fn parse_install_list(text: &str) -> Vec<PackageInfo> {
    text.lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| {
            let line = line.trim_end().strip_suffix(':')?;
            let (name, rest) = line.split_once(char::is_whitespace)?;
            let version = rest.trim_start().strip_prefix('v')?;
            if name.is_empty() || version.is_empty() {
                return None;
            }
            Some(PackageInfo::new(name, version, NAME))
        })
        .collect()
}

#[async_trait]
impl Provider for CargoProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn check_installation(&self) -> Result<()> {
        let out = self.query.run("which cargo", RunOptions::default()).await?;
        if !out.success() {
            bail!("cargo is not installed or not in PATH");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn install(&self, packages: &[PackageInfo]) -> Result<()> {
        let commands = packages.iter().map(Self::install_command).collect();
        self.run_all(commands, "installing").await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn uninstall(&self, packages: &[String]) -> Result<()> {
        let commands = packages
            .iter()
            .map(|name| format!("cargo uninstall {}", name))
            .collect();
        self.run_all(commands, "uninstalling").await;
        Ok(())
    }

    async fn get_installed(&self) -> Result<Vec<PackageInfo>> {
        let out = self
            .query
            .run("cargo install --list", RunOptions::checked())
            .await?;
        Ok(parse_install_list(&out.stdout))
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, packages: &[String]) -> Result<()> {
        let names: Vec<String> = if packages.is_empty() {
            self.get_installed()
                .await?
                .into_iter()
                .map(|p| p.name)
                .collect()
        } else {
            packages.to_vec()
        };

        let commands = names
            .iter()
            .map(|name| format!("cargo install {}", name))
            .collect();
        self.run_all(commands, "updating").await;
        Ok(())
    }
}
