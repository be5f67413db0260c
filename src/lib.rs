#![forbid(unsafe_code)]

//! Declarative orchestrator for named, long-lived interactive shell sessions.

pub mod commands;
pub mod config;
pub mod config_watcher;
pub mod errors;
pub mod events;
pub mod host;
pub mod manifest;
pub mod models;
pub mod orchestrator;
pub mod paths;
pub mod script;

pub use config::WorkspaceConfig;
pub use errors::{AppError, Result};
pub use orchestrator::Orchestrator;
