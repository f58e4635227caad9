//! Core implementation of the ahoy command runner
//!
//! Ahoy reads a `.ahoy.yml` manifest of named shell snippets, builds a
//! command-line interface out of it, and runs the selected snippet through a
//! configurable entrypoint. Manifests can import other manifests to form
//! nested command groups, and can load environment variables from env files.

use std::path::PathBuf;

use log::debug;

use crate::commands::command::ResolvedCommand;
use crate::commands::tree::build_commands;
use crate::config_file::{Config, ConfigError, resolve_config_path};
use crate::context::RunContext;

pub mod cli;
pub mod commands;
pub mod config_file;
pub mod context;
pub mod env_file;
pub mod exec;
pub mod init;
pub mod logger;
pub mod report;
pub mod validation;

/// A loaded config together with its resolved command tree
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: Config,
    pub commands: Vec<ResolvedCommand>,
}

/// Locate, load, and resolve the active config.
///
/// Returns `Ok(None)` when no `-f` was given and no `.ahoy.yml` exists in the
/// working directory or any of its parents.
///
/// # Errors
///
/// Returns `ConfigError` if an explicit config path is unusable, the config or
/// one of its imports can't be parsed, fails validation, or declares an
/// invalid command.
pub fn load_commands(ctx: &RunContext) -> Result<Option<LoadedConfig>, ConfigError> {
    let Some(path) = resolve_config_path(ctx)? else {
        return Ok(None);
    };
    debug!("Using config file {}", path.display());
    let config = config_file::load(&path, ctx)?;
    let commands = build_commands(&config, &path, ctx)?;
    debug!(
        "Loaded {} top-level commands from {}",
        commands.len(),
        path.display()
    );
    Ok(Some(LoadedConfig {
        path,
        config,
        commands,
    }))
}
