use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::commands::command::{CommandAction, CommandKind, ResolvedCommand};
use crate::config_file::{self, Config, ConfigCommand, ConfigError, expand_path};
use crate::context::RunContext;
use crate::env_file::expand_env_paths;

/// State carried down while resolving one config and its imports
#[derive(Debug, Clone)]
struct Scope {
    /// Config file being resolved
    path: PathBuf,
    /// Its directory: base for relative paths and working dir for its commands
    dir: PathBuf,
    /// Canonical paths of the configs currently being resolved, outermost first
    chain: Vec<PathBuf>,
}

impl Scope {
    fn root(path: &Path) -> Self {
        Scope {
            path: path.to_path_buf(),
            dir: parent_dir(path),
            chain: vec![canonical(path)],
        }
    }

    fn detached(dir: &Path) -> Self {
        Scope {
            path: dir.to_path_buf(),
            dir: dir.to_path_buf(),
            chain: Vec::new(),
        }
    }

    /// Scope for an imported file, or `None` if it is already being resolved
    fn enter(&self, path: &Path) -> Option<Scope> {
        let key = canonical(path);
        if self.chain.contains(&key) {
            return None;
        }
        let mut chain = self.chain.clone();
        chain.push(key);
        Some(Scope {
            path: path.to_path_buf(),
            dir: parent_dir(path),
            chain,
        })
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Build the resolved command tree for a loaded config.
///
/// Commands come out sorted by name. Commands with `imports` become groups
/// whose children are the merged commands of every import that exists.
///
/// # Errors
///
/// Returns `ConfigError::CommandSpec` for a command that doesn't set exactly
/// one of `cmd` and `imports`, `ConfigError::EmptyImports` for a required
/// command whose imports yield nothing, or any error loading an import.
pub fn build_commands(
    config: &Config,
    config_path: &Path,
    ctx: &RunContext,
) -> Result<Vec<ResolvedCommand>, ConfigError> {
    build_scoped(config, &Scope::root(config_path), ctx)
}

/// Resolve a list of import paths relative to `base_dir` into a merged,
/// sorted command list. When two imports define the same name the later one
/// wins.
///
/// # Errors
///
/// Returns any error from loading or building an imported config.
pub fn resolve_imports(
    imports: &[String],
    base_dir: &Path,
    ctx: &RunContext,
) -> Result<Vec<ResolvedCommand>, ConfigError> {
    merge_imports(imports, &Scope::detached(base_dir), ctx)
}

fn build_scoped(
    config: &Config,
    scope: &Scope,
    ctx: &RunContext,
) -> Result<Vec<ResolvedCommand>, ConfigError> {
    let entrypoint = config.entrypoint();
    let global_env = expand_env_paths(&config.env, &scope.dir);

    let mut resolved = Vec::with_capacity(config.commands.len());
    for (name, spec) in &config.commands {
        spec.check_shape()
            .map_err(|problem| ConfigError::CommandSpec {
                command: name.clone(),
                path: scope.path.clone(),
                problem,
            })?;

        let kind = match (&spec.imports, spec.cmd()) {
            (Some(imports), _) => {
                let children = merge_imports(imports, scope, ctx)?;
                if children.is_empty() {
                    if spec.optional {
                        debug!("Optional command [{name}] resolved no commands, skipping");
                        continue;
                    }
                    return Err(ConfigError::EmptyImports {
                        command: name.clone(),
                        path: scope.path.clone(),
                    });
                }
                CommandKind::Group(children)
            }
            (None, cmd) => {
                let mut env_files = global_env.clone();
                env_files.extend(expand_env_paths(&spec.env, &scope.dir));
                CommandKind::Action(CommandAction {
                    name: name.clone(),
                    cmd: cmd.unwrap_or_default().to_string(),
                    entrypoint: entrypoint.clone(),
                    cwd: scope.dir.clone(),
                    env_files,
                    source: scope.path.clone(),
                })
            }
        };
        resolved.push(resolved_command(name, spec, kind));
    }
    Ok(resolved)
}

fn resolved_command(name: &str, spec: &ConfigCommand, kind: CommandKind) -> ResolvedCommand {
    ResolvedCommand {
        name: name.to_string(),
        aliases: spec.aliases.clone(),
        usage: spec.usage.clone(),
        description: spec.description.clone(),
        hide: spec.hide,
        kind,
    }
}

fn merge_imports(
    imports: &[String],
    scope: &Scope,
    ctx: &RunContext,
) -> Result<Vec<ResolvedCommand>, ConfigError> {
    let mut merged: BTreeMap<String, ResolvedCommand> = BTreeMap::new();
    for entry in imports.iter().filter(|entry| !entry.is_empty()) {
        let path = expand_path(entry, &scope.dir);
        // Missing imports are how private command sets are left out
        if !path.is_file() {
            debug!("Skipping import {}: not found", path.display());
            continue;
        }
        let Some(child) = scope.enter(&path) else {
            warn!(
                "Import cycle: {} is already being loaded, ignoring it in {}",
                path.display(),
                scope.path.display()
            );
            continue;
        };
        let config = config_file::load(&path, ctx)?;
        for command in build_scoped(&config, &child, ctx)? {
            merged.insert(command.name.clone(), command);
        }
    }
    Ok(merged.into_values().collect())
}
