//! CLI command implementations.

pub mod config;
mod list_installed;
mod paths;
mod providers;
mod sync;
mod update;

pub use list_installed::list_installed;
pub use paths::{ROOT_ENV, default_root_dir};
pub use providers::providers;
pub use sync::{SyncFlags, sync};
pub use update::update;
