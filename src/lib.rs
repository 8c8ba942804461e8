pub mod commands;
pub mod config;
pub mod engine;
pub mod filesystem;
pub mod module;
pub mod package;
pub mod provider;
pub mod runtime;
pub mod shell;
pub mod variables;
