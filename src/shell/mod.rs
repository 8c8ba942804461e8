//! Process execution for providers and module hooks.
//!
//! [`SystemShell`] runs commands for real; [`DryShell`] only reports them.
//! Providers hold one of each so read-only queries stay accurate during a
//! dry run.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;
use std::process::Stdio;
use tokio::process::Command;

/// Per-command execution options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Fail when the command exits non-zero.
    pub check: bool,
    /// Run through `sudo`.
    pub as_root: bool,
    /// Let stdout through to the terminal instead of capturing it.
    pub display_output: bool,
}

impl RunOptions {
    pub fn checked() -> Self {
        Self {
            check: true,
            ..Default::default()
        }
    }

    pub fn root() -> Self {
        Self {
            as_root: true,
            display_output: true,
            ..Default::default()
        }
    }

    pub fn displayed() -> Self {
        Self {
            display_output: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub code: i32,
    pub stdout: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Shell: Send + Sync {
    async fn run(&self, command: &str, options: RunOptions) -> Result<ShellOutput>;
}

/// Runs commands through `sh -c`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

#[async_trait]
impl Shell for SystemShell {
    #[tracing::instrument(skip(self))]
    async fn run(&self, command: &str, options: RunOptions) -> Result<ShellOutput> {
        let line = if options.as_root {
            format!("sudo {}", command)
        } else {
            command.to_string()
        };
        debug!("Running: {}", line);

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&line)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());
        cmd.stdout(if options.display_output {
            Stdio::inherit()
        } else {
            Stdio::piped()
        });

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to start `{}`", line))?;

        // Killed by a signal has no exit code.
        let code = output.status.code().unwrap_or(-1);
        if code != 0 && options.check {
            bail!("Process called with `{}` returned exit code {}", line, code);
        }

        Ok(ShellOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Prints commands instead of running them and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryShell;

#[async_trait]
impl Shell for DryShell {
    async fn run(&self, command: &str, options: RunOptions) -> Result<ShellOutput> {
        let prefix = if options.as_root { "sudo " } else { "" };
        println!("Would run: $ {}{}", prefix, command);
        Ok(ShellOutput::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_shell_captures_stdout() {
        let out = SystemShell
            .run("echo hello && echo world", RunOptions::default())
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello\nworld\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_shell_unchecked_failure_returns_code() {
        let out = SystemShell
            .run("exit 3", RunOptions::default())
            .await
            .unwrap();
        assert_eq!(out.code, 3);
        assert!(!out.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_shell_checked_failure_is_error() {
        let err = SystemShell
            .run("exit 2", RunOptions::checked())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exit code 2"));
    }

    #[tokio::test]
    async fn test_dry_shell_never_fails() {
        let out = DryShell
            .run("pacman -Rs --noconfirm git", RunOptions::root())
            .await
            .unwrap();
        assert_eq!(out, ShellOutput::default());
        assert!(out.success());
    }
}
