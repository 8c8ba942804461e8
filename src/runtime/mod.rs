//! Runtime abstraction for system operations.
//!
//! Everything that touches the real machine (files, symlinks, the home
//! directory, the terminal) goes through [`Runtime`], so the filesystem
//! syncer and lockfile can be tested against a mock.
//!
//! # Structure
//!
//! - `path` - Lexical path helpers (normalize, absolutize)
//! - `env` - Environment variables and the home directory
//! - `fs` - File and directory operations
//! - `symlink` - Symlink creation and inspection
//! - `prompt` - Interactive y/N confirmation

mod env;
mod fs;
pub mod path;
mod prompt;
mod symlink;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use path::{absolutize, normalize_path};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;
    fn home_dir(&self) -> Option<PathBuf>;

    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> Result<u64>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// True if the path resolves to something. Follows symlinks, so a
    /// dangling link reports false; use [`Runtime::is_symlink`] for the link itself.
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;

    // Symlinks
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;
    fn read_link(&self, path: &Path) -> Result<PathBuf>;
    fn is_symlink(&self, path: &Path) -> bool;
    fn remove_symlink(&self, path: &Path) -> Result<()>;

    // User interaction
    /// Prompt user for confirmation. Returns true if user confirms (y/yes), false otherwise.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.rename_impl(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        self.copy_impl(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.is_file_impl(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link)
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.read_link_impl(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }

    fn remove_symlink(&self, path: &Path) -> Result<()> {
        self.remove_symlink_impl(path)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.confirm_impl(prompt)
    }
}
