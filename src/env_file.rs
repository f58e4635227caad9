//! Reading `KEY=VALUE` environment files referenced from a config

use std::path::{Path, PathBuf};

use log::debug;

use crate::config_file::expand_path;

/// Read an environment file into its assignment lines.
///
/// Blank lines and `#` comments are dropped, everything else is returned
/// trimmed and otherwise verbatim. A missing or unreadable file yields no
/// assignments.
#[must_use]
pub fn read_env_file(path: &Path) -> Vec<String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("Skipping env file {}: {e}", path.display());
            return Vec::new();
        }
    };
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Expand env file entries from a config relative to its directory.
#[must_use]
pub fn expand_env_paths(entries: &[String], base_dir: &Path) -> Vec<PathBuf> {
    entries
        .iter()
        .map(|entry| expand_path(entry, base_dir))
        .collect()
}

/// Read several env files, concatenating their assignments in order.
#[must_use]
pub fn read_env_files(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().flat_map(|p| read_env_file(p)).collect()
}

/// Split assignment lines into key/value pairs for a process environment.
///
/// Later pairs for the same key override earlier ones once applied.
#[must_use]
pub fn env_pairs(lines: &[String]) -> Vec<(String, String)> {
    lines
        .iter()
        .filter_map(|line| match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Some((key.trim().to_string(), value.to_string()))
            }
            _ => {
                debug!("Ignoring malformed env assignment: {line}");
                None
            }
        })
        .collect()
}
