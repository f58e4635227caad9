//! Configuration file handling for Ahoy

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::context::RunContext;
use crate::validation::{self, Severity};

/// Name of the config file searched for in the working directory and its parents
pub const FILENAME: &str = ".ahoy.yml";

/// The only schema version this build understands
pub const SUPPORTED_API_VERSION: &str = "v2";

/// Entrypoint used when a config doesn't declare one
pub const DEFAULT_ENTRYPOINT: [&str; 4] = ["bash", "-c", "{{cmd}}", "{{name}}"];

/// Errors that can occur while locating, loading or assembling configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "An ahoy config file was specified using -f to be at {0} but couldn't be found. Check your path."
    )]
    SpecifiedNotFound(PathBuf),
    #[error("The ahoy config file specified using -f at {0} is a directory, not a file")]
    NotAFile(PathBuf),
    #[error(
        "An ahoy config file couldn't be read at {path}. You can create an example one by using 'ahoy init'"
    )]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Ahoy only supports API version 'v2', but '{found}' given in {path}")]
    UnsupportedApiVersion { found: String, path: PathBuf },
    #[error("Command [{command}] in {path} {problem}. Check your yaml file.")]
    CommandSpec {
        command: String,
        path: PathBuf,
        problem: SpecProblem,
    },
    #[error(
        "Command [{command}] in {path} has 'imports' set, but no commands were found. Check the import paths, or mark the command 'optional: true' if they may be absent."
    )]
    EmptyImports { command: String, path: PathBuf },
    #[error("Invalid config {path}:\n{}", .messages.join("\n"))]
    Invalid { path: PathBuf, messages: Vec<String> },
}

/// Structural problems with a single command entry
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecProblem {
    #[error("has neither 'cmd' or 'imports' set")]
    Neither,
    #[error("has both 'cmd' and 'imports' set, but only one is allowed")]
    Both,
    #[error("has 'imports' set, but it is empty")]
    EmptyImports,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept either a bare string or a list of strings, normalized to a list.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<OneOrMany>::deserialize(deserializer)?;
    let list = match value {
        None => Vec::new(),
        Some(OneOrMany::One(single)) => vec![single],
        Some(OneOrMany::Many(many)) => many,
    };
    Ok(list.into_iter().filter(|s| !s.is_empty()).collect())
}

/// Configuration for a single named command
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ConfigCommand {
    pub description: Option<String>,
    pub usage: Option<String>,
    pub cmd: Option<String>,
    pub imports: Option<Vec<String>>,
    #[serde(default)]
    pub hide: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub env: Vec<String>,
}

impl ConfigCommand {
    /// The shell snippet, treating an empty string as unset
    #[must_use]
    pub fn cmd(&self) -> Option<&str> {
        self.cmd.as_deref().filter(|c| !c.is_empty())
    }

    /// Check that exactly one of `cmd` and `imports` is set.
    ///
    /// # Errors
    ///
    /// Returns the `SpecProblem` describing the violation.
    pub fn check_shape(&self) -> Result<(), SpecProblem> {
        match (self.cmd(), &self.imports) {
            (None, None) => Err(SpecProblem::Neither),
            (Some(_), Some(_)) => Err(SpecProblem::Both),
            (None, Some(imports)) if imports.is_empty() => Err(SpecProblem::EmptyImports),
            _ => Ok(()),
        }
    }
}

/// Root configuration structure of an `.ahoy.yml` file (or an imported one)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default, alias = "api_version")]
    pub ahoyapi: String,
    pub usage: Option<String>,
    pub entrypoint: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list")]
    pub env: Vec<String>,
    #[serde(default)]
    pub commands: BTreeMap<String, ConfigCommand>,
}

impl Config {
    /// Parse YAML without enforcing the API version.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Yaml` if the document doesn't match the schema.
    pub fn parse(contents: &str, path: &Path) -> Result<Config, ConfigError> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Yaml {
            source: e,
            path: path.to_path_buf(),
        })
    }

    /// Loads and parses a configuration file, enforcing the API version and
    /// filling in the default entrypoint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Unreadable` if the file cannot be read,
    /// `ConfigError::Yaml` if parsing fails, or
    /// `ConfigError::UnsupportedApiVersion` on a version mismatch.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file).map_err(|e| ConfigError::Unreadable {
            path: file.to_path_buf(),
            source: e,
        })?;
        let mut config = Config::parse(&contents, file)?;
        if config.ahoyapi != SUPPORTED_API_VERSION {
            return Err(ConfigError::UnsupportedApiVersion {
                found: config.ahoyapi,
                path: file.to_path_buf(),
            });
        }
        config.entrypoint.get_or_insert_with(default_entrypoint);
        Ok(config)
    }

    /// The entrypoint template, falling back to the default
    #[must_use]
    pub fn entrypoint(&self) -> Vec<String> {
        self.entrypoint.clone().unwrap_or_else(default_entrypoint)
    }
}

fn default_entrypoint() -> Vec<String> {
    DEFAULT_ENTRYPOINT.iter().map(ToString::to_string).collect()
}

/// Load a config file and, unless the context skips it, run the validation
/// engine over it.
///
/// # Errors
///
/// Returns any `Config::from_file` error, or `ConfigError::Invalid` when
/// validation reports error-severity issues.
pub fn load(path: &Path, ctx: &RunContext) -> Result<Config, ConfigError> {
    let config = Config::from_file(path)?;
    if ctx.skip_validation {
        return Ok(config);
    }
    let result = validation::validate_config(&config, path, &ctx.tool_version);
    for issue in &result.issues {
        match issue.severity {
            Severity::Error => {}
            Severity::Warning => info!("{}", issue.message),
            Severity::Info => debug!("{}", issue.message),
        }
    }
    if result.has_error {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            messages: result
                .issues
                .into_iter()
                .filter(|i| i.severity == Severity::Error)
                .map(|i| i.message)
                .collect(),
        });
    }
    Ok(config)
}

/// Expand a path from a config file: `~` is the home directory, absolute
/// paths are kept, everything else is relative to `base`.
#[must_use]
pub fn expand_path(path: &str, base: &Path) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.trim_start_matches('~').trim_start_matches('/'));
        }
        return PathBuf::from(path);
    }
    if path.starts_with('~') {
        return PathBuf::from(path);
    }
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

/// Searches for `.ahoy.yml` in `start` and its parents.
///
/// Returns `None` when the filesystem root is reached without a match.
#[must_use]
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut path = start.to_path_buf();
    let mut visited = HashSet::new();
    debug!("Searching for {FILENAME} from {}", start.display());
    loop {
        if !visited.insert(path.clone()) {
            return None;
        }
        let candidate = path.join(FILENAME);
        if candidate.is_file() {
            debug!("Found {FILENAME} at {}", candidate.display());
            return Some(candidate);
        }
        if !path.pop() {
            debug!("Can't find an {FILENAME} file");
            return None;
        }
    }
}

/// Resolve the active config file: the explicit `-f` path if one was given,
/// otherwise the nearest `.ahoy.yml` above the working directory.
///
/// # Errors
///
/// Returns `ConfigError::SpecifiedNotFound` or `ConfigError::NotAFile` when an
/// explicit path is unusable. A failed search is `Ok(None)`.
pub fn resolve_config_path(ctx: &RunContext) -> Result<Option<PathBuf>, ConfigError> {
    match ctx.explicit_config() {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::SpecifiedNotFound(path));
            }
            if path.is_dir() {
                return Err(ConfigError::NotAFile(path));
            }
            Ok(Some(path))
        }
        None => Ok(find_config(&ctx.cwd)),
    }
}
