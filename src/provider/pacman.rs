//! Arch Linux package managers: official repositories through pacman, and
//! yay for the AUR.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::warn;

use super::Provider;
use crate::package::PackageInfo;
use crate::shell::{RunOptions, Shell};

/// Packages per pacman invocation.
const MAX_AT_ONCE: usize = 5;

/// Which pacman-compatible front end a provider drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flavor {
    name: &'static str,
    binary: &'static str,
    /// pacman needs root; yay refuses to run as root and escalates itself.
    as_root: bool,
    /// Leave out foreign packages (AUR and local builds) from the installed list.
    official_only: bool,
}

const OFFICIAL: Flavor = Flavor {
    name: "arch-official",
    binary: "pacman",
    as_root: true,
    official_only: true,
};

const YAY: Flavor = Flavor {
    name: "yay",
    binary: "yay",
    as_root: false,
    official_only: false,
};

pub struct PacmanProvider {
    flavor: Flavor,
    run: Arc<dyn Shell>,
    query: Arc<dyn Shell>,
}

impl PacmanProvider {
    /// Official repositories, `arch-official`.
    pub fn new(run: Arc<dyn Shell>, query: Arc<dyn Shell>) -> Self {
        Self {
            flavor: OFFICIAL,
            run,
            query,
        }
    }

    /// Official repositories plus the AUR through yay.
    pub fn yay(run: Arc<dyn Shell>, query: Arc<dyn Shell>) -> Self {
        Self {
            flavor: YAY,
            run,
            query,
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            as_root: self.flavor.as_root,
            ..RunOptions::displayed()
        }
    }

    /// Run `<binary> <flags> <names>`, one partition at a time.
    /// A failed partition is reported and the next one still runs.
    async fn run_partitioned(&self, flags: &str, names: &[String], action: &str) {
        for part in names.chunks(MAX_AT_ONCE) {
            let joined = part.join(" ");
            println!("{} {}", action, joined);

            let command = format!("{} {} --noconfirm {}", self.flavor.binary, flags, joined);
            match self.run.run(&command, self.run_options()).await {
                Ok(out) if out.success() => {}
                Ok(out) => println!(
                    "Error {} packages: {} (exit code {}). See the logs above",
                    action.to_lowercase(),
                    joined,
                    out.code
                ),
                Err(e) => {
                    warn!("`{}` failed: {:#}", command, e);
                    println!("Error {} packages: {}: {:#}", action.to_lowercase(), joined, e);
                }
            }
        }
    }

    /// Run a `-Q` query. pacman exits 1 with no output when nothing matches,
    /// which is an empty list rather than a failure.
    async fn query_lines(&self, flags: &str) -> Result<Vec<(String, String)>> {
        let command = format!("{} {}", self.flavor.binary, flags);
        let out = self
            .query
            .run(&command, RunOptions::default())
            .await
            .with_context(|| format!("Failed to list packages with `{}`", command))?;
        match out.code {
            0 => parse_package_lines(&out.stdout),
            1 if out.stdout.trim().is_empty() => Ok(Vec::new()),
            code => bail!(
                "Failed to list packages with `{}`: exit code {}",
                command,
                code
            ),
        }
    }
}

/// Parse `pacman -Q` style output: one `name version` pair per line.
pub(crate) fn parse_package_lines(text: &str) -> Result<Vec<(String, String)>> {
    let mut packages = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((name, version)) = line.split_once(char::is_whitespace) else {
            bail!("Failed to parse pacman package line: {}", line);
        };
        let version = version.trim();
        if version.is_empty() {
            bail!("Failed to parse pacman package line: {}", line);
        }
        packages.push((name.to_string(), version.to_string()));
    }
    Ok(packages)
}

#[async_trait]
impl Provider for PacmanProvider {
    fn name(&self) -> &str {
        self.flavor.name
    }

    async fn check_installation(&self) -> Result<()> {
        let command = format!("which {}", self.flavor.binary);
        let out = self.query.run(&command, RunOptions::default()).await?;
        if !out.success() {
            bail!("{} is not installed or not in PATH", self.flavor.binary);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn install(&self, packages: &[PackageInfo]) -> Result<()> {
        // Repositories carry one version per package; pins are not expressible.
        let names: Vec<String> = packages.iter().map(|p| p.name.clone()).collect();
        self.run_partitioned("-S", &names, "Installing").await;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn uninstall(&self, packages: &[String]) -> Result<()> {
        self.run_partitioned("-Rs", packages, "Uninstalling").await;
        Ok(())
    }

    /// Explicitly installed packages. The official flavor drops foreign ones.
    async fn get_installed(&self) -> Result<Vec<PackageInfo>> {
        let explicit = self.query_lines("-Qe").await?;
        let foreign: HashSet<String> = if self.flavor.official_only {
            self.query_lines("-Qm")
                .await?
                .into_iter()
                .map(|(name, _)| name)
                .collect()
        } else {
            HashSet::new()
        };

        Ok(explicit
            .into_iter()
            .filter(|(name, _)| !foreign.contains(name))
            .map(|(name, version)| PackageInfo::new(name, version, self.flavor.name))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            let command = format!("{} -Syu --noconfirm", self.flavor.binary);
            let out = self.run.run(&command, self.run_options()).await?;
            if !out.success() {
                println!("Error updating system packages. See the logs above");
            }
            return Ok(());
        }
        self.run_partitioned("-Syu", packages, "Updating").await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ANY_VERSION;
    use crate::shell::{MockShell, ShellOutput};
    use std::sync::Mutex;

    fn output(code: i32, stdout: &str) -> ShellOutput {
        ShellOutput {
            code,
            stdout: stdout.to_string(),
        }
    }

    #[test]
    fn test_parse_package_lines() {
        let parsed = parse_package_lines("git 2.47.0-1\nneovim 0.10.2-1\n\n").unwrap();
        assert_eq!(
            parsed,
            vec![
                ("git".to_string(), "2.47.0-1".to_string()),
                ("neovim".to_string(), "0.10.2-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_package_lines_rejects_garbage() {
        assert!(parse_package_lines("justaname\n").is_err());
    }

    #[tokio::test]
    async fn test_get_installed_excludes_foreign() {
        let mut query = MockShell::new();
        query
            .expect_run()
            .withf(|cmd: &str, opts: &RunOptions| cmd == "pacman -Qe" && *opts == RunOptions::default())
            .times(1)
            .returning(|_, _| Ok(output(0, "git 2.47.0-1\nyay 12.4.2-1\nzsh 5.9-5\n")));
        query
            .expect_run()
            .withf(|cmd: &str, opts: &RunOptions| cmd == "pacman -Qm" && *opts == RunOptions::default())
            .times(1)
            .returning(|_, _| Ok(output(0, "yay 12.4.2-1\n")));

        let provider = PacmanProvider::new(Arc::new(MockShell::new()), Arc::new(query));
        let installed = provider.get_installed().await.unwrap();

        assert_eq!(
            installed,
            vec![
                PackageInfo::new("git", "2.47.0-1", "arch-official"),
                PackageInfo::new("zsh", "5.9-5", "arch-official"),
            ]
        );
    }

    #[tokio::test]
    async fn test_install_partitions_and_continues_after_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut run = MockShell::new();
        let calls_clone = calls.clone();
        run.expect_run().returning(move |cmd, opts| {
            assert!(opts.as_root);
            let mut calls = calls_clone.lock().unwrap();
            calls.push(cmd.to_string());
            // First partition fails.
            Ok(output(if calls.len() == 1 { 1 } else { 0 }, ""))
        });

        let packages: Vec<PackageInfo> = (1..=7)
            .map(|i| PackageInfo::new(format!("p{}", i), ANY_VERSION, "arch-official"))
            .collect();

        let provider = PacmanProvider::new(Arc::new(run), Arc::new(MockShell::new()));
        provider.install(&packages).await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            [
                "pacman -S --noconfirm p1 p2 p3 p4 p5",
                "pacman -S --noconfirm p6 p7",
            ]
        );
    }

    #[tokio::test]
    async fn test_uninstall_nothing_runs_nothing() {
        let mut run = MockShell::new();
        run.expect_run().never();

        let provider = PacmanProvider::new(Arc::new(run), Arc::new(MockShell::new()));
        provider.uninstall(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_everything() {
        let mut run = MockShell::new();
        run.expect_run()
            .withf(|cmd: &str, _: &RunOptions| cmd == "pacman -Syu --noconfirm")
            .times(1)
            .returning(|_, _| Ok(output(0, "")));

        let provider = PacmanProvider::new(Arc::new(run), Arc::new(MockShell::new()));
        provider.update(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_installed_without_foreign_packages() {
        // pacman -Qm exits 1 with no output when nothing is foreign.
        let mut query = MockShell::new();
        query
            .expect_run()
            .withf(|cmd: &str, _: &RunOptions| cmd == "pacman -Qe")
            .returning(|_, _| Ok(output(0, "git 2.47.0-1\n")));
        query
            .expect_run()
            .withf(|cmd: &str, _: &RunOptions| cmd == "pacman -Qm")
            .returning(|_, _| Ok(output(1, "")));

        let provider = PacmanProvider::new(Arc::new(MockShell::new()), Arc::new(query));
        let installed = provider.get_installed().await.unwrap();

        assert_eq!(installed, vec![PackageInfo::new("git", "2.47.0-1", "arch-official")]);
    }

    #[tokio::test]
    async fn test_get_installed_fails_on_real_query_error() {
        let mut query = MockShell::new();
        query
            .expect_run()
            .returning(|_, _| Ok(output(1, "error: could not open database\n")));

        let provider = PacmanProvider::new(Arc::new(MockShell::new()), Arc::new(query));
        let err = provider.get_installed().await.unwrap_err();
        assert!(err.to_string().contains("pacman -Qe"));
    }

    #[tokio::test]
    async fn test_yay_lists_everything_explicit() {
        let mut query = MockShell::new();
        query
            .expect_run()
            .withf(|cmd: &str, opts: &RunOptions| cmd == "yay -Qe" && *opts == RunOptions::default())
            .times(1)
            .returning(|_, _| Ok(output(0, "git 2.47.0-1\nparu-bin 2.0.4-1\n")));

        let provider = PacmanProvider::yay(Arc::new(MockShell::new()), Arc::new(query));
        let installed = provider.get_installed().await.unwrap();

        assert_eq!(provider.name(), "yay");
        assert_eq!(
            installed,
            vec![
                PackageInfo::new("git", "2.47.0-1", "yay"),
                PackageInfo::new("paru-bin", "2.0.4-1", "yay"),
            ]
        );
    }

    #[tokio::test]
    async fn test_yay_installs_without_root() {
        let mut run = MockShell::new();
        run.expect_run()
            .withf(|cmd: &str, opts: &RunOptions| {
                cmd == "yay -S --noconfirm paru-bin" && !opts.as_root && opts.display_output
            })
            .times(1)
            .returning(|_, _| Ok(output(0, "")));

        let provider = PacmanProvider::yay(Arc::new(run), Arc::new(MockShell::new()));
        provider
            .install(&[PackageInfo::new("paru-bin", ANY_VERSION, "yay")])
            .await
            .unwrap();
    }
}
