use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use crate::runtime::Runtime;

pub const ROOT_ENV: &str = "SYSDEF_ROOT_DIR";

/// Root from `--root`, then `SYSDEF_ROOT_DIR`, then `$HOME/sysdef`.
#[tracing::instrument(skip(runtime))]
pub fn resolve_root<R: Runtime>(runtime: &R, root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(path) => path,
        None => default_root_dir(runtime)?,
    };
    info!("Using root: {}", root.display());
    Ok(root)
}

#[tracing::instrument(skip(runtime))]
pub fn default_root_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if let Ok(dir) = runtime.env_var(ROOT_ENV)
        && !dir.is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    let home_dir = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home_dir.join("sysdef"))
}
