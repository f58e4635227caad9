//! Version-gated validation of a loaded configuration
//!
//! Each optional schema feature has a minimum tool version. Validation walks a
//! config and reports feature usage the running version can't honour, plus
//! referenced files (imports, env files) that are missing on disk.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config_file::{Config, ConfigCommand, SUPPORTED_API_VERSION, expand_path};

/// Version string that supports every feature
pub const DEVELOPMENT_VERSION: &str = "development";

/// Minimum version supporting each optional schema feature
pub const FEATURE_SUPPORT: [(&str, &str); 4] = [
    ("command_aliases", "v2.1.0"),
    ("optional_imports", "v2.2.0"),
    ("multiple_env_files", "v2.5.0"),
    ("schema_validation", "v2.6.0"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    VersionMismatch,
    MissingFile,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub file: PathBuf,
    pub field: String,
    pub feature: Option<&'static str>,
    pub required_version: Option<&'static str>,
    pub current_version: Option<String>,
    pub suggestion: Option<String>,
}

impl Issue {
    fn new(kind: IssueKind, severity: Severity, file: &Path, field: String, message: String) -> Self {
        Issue {
            kind,
            severity,
            message,
            file: file.to_path_buf(),
            field,
            feature: None,
            required_version: None,
            current_version: None,
            suggestion: None,
        }
    }

    fn gated(mut self, feature: &'static str, current: &str) -> Self {
        self.feature = Some(feature);
        self.required_version = required_version(feature);
        self.current_version = Some(current.to_string());
        self
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub issues: Vec<Issue>,
    pub has_error: bool,
}

impl ValidationResult {
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Minimum version for a known feature
#[must_use]
pub fn required_version(feature: &str) -> Option<&'static str> {
    FEATURE_SUPPORT
        .iter()
        .find(|(name, _)| *name == feature)
        .map(|(_, version)| *version)
}

/// Compare dotted version strings.
///
/// A leading `v` is ignored and only the first three components count.
/// Missing or non-numeric components compare as zero.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn components(version: &str) -> [u64; 3] {
        let mut parts = [0; 3];
        let trimmed = version.strip_prefix('v').unwrap_or(version);
        for (slot, part) in parts.iter_mut().zip(trimmed.split('.')) {
            *slot = part.parse().unwrap_or(0);
        }
        parts
    }
    components(a).cmp(&components(b))
}

/// Whether `current` supports `feature`.
///
/// Unknown features and development builds support everything.
#[must_use]
pub fn version_supports(current: &str, feature: &str) -> bool {
    let Some(required) = required_version(feature) else {
        return true;
    };
    if current.is_empty() || current == DEVELOPMENT_VERSION {
        return true;
    }
    compare_versions(current, required) != Ordering::Less
}

/// Validate a config against the feature table for `current_version`.
#[must_use]
pub fn validate_config(config: &Config, config_file: &Path, current_version: &str) -> ValidationResult {
    let mut issues = Vec::new();
    let config_dir = config_file.parent().unwrap_or(Path::new("."));

    if config.ahoyapi != SUPPORTED_API_VERSION {
        issues.push(Issue::new(
            IssueKind::VersionMismatch,
            Severity::Error,
            config_file,
            "ahoyapi".to_string(),
            format!(
                "Unsupported API version '{}'. Only '{SUPPORTED_API_VERSION}' is currently supported.",
                config.ahoyapi
            ),
        ));
    }

    if config.env.len() > 1 && !version_supports(current_version, "multiple_env_files") {
        issues.push(
            Issue::new(
                IssueKind::VersionMismatch,
                Severity::Warning,
                config_file,
                "env".to_string(),
                "Multiple environment files detected. This feature requires proper support."
                    .to_string(),
            )
            .gated("multiple_env_files", current_version)
            .suggest("This should work but consider upgrading for better support."),
        );
    }

    for env_path in &config.env {
        if !expand_path(env_path, config_dir).is_file() {
            issues.push(
                Issue::new(
                    IssueKind::MissingFile,
                    Severity::Warning,
                    config_file,
                    "env".to_string(),
                    format!("Global environment file '{env_path}' not found (will be ignored)"),
                )
                .suggest(format!(
                    "Create the file '{env_path}' or remove it from the configuration"
                )),
            );
        }
    }

    for (name, command) in &config.commands {
        issues.extend(validate_command(name, command, config_file, config_dir, current_version));
    }

    let has_error = issues.iter().any(|i| i.severity == Severity::Error);
    ValidationResult { issues, has_error }
}

fn validate_command(
    name: &str,
    command: &ConfigCommand,
    config_file: &Path,
    config_dir: &Path,
    current: &str,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    if command.optional && !version_supports(current, "optional_imports") {
        issues.push(
            Issue::new(
                IssueKind::VersionMismatch,
                Severity::Error,
                config_file,
                format!("commands.{name}.optional"),
                format!(
                    "Command '{name}' uses 'optional: true' which requires Ahoy {} or later",
                    required_version("optional_imports").unwrap_or_default()
                ),
            )
            .gated("optional_imports", current)
            .suggest("Upgrade Ahoy or remove 'optional: true' from the command"),
        );
    }

    if !command.aliases.is_empty() && !version_supports(current, "command_aliases") {
        issues.push(
            Issue::new(
                IssueKind::VersionMismatch,
                Severity::Warning,
                config_file,
                format!("commands.{name}.aliases"),
                format!(
                    "Command '{name}' uses aliases which require Ahoy {} or later",
                    required_version("command_aliases").unwrap_or_default()
                ),
            )
            .gated("command_aliases", current)
            .suggest("Upgrade Ahoy for full alias support"),
        );
    }

    for import in command.imports.iter().flatten() {
        if import.is_empty() || expand_path(import, config_dir).is_file() {
            continue;
        }
        let field = format!("commands.{name}.imports");
        let issue = match (command.optional, version_supports(current, "optional_imports")) {
            (true, false) => Issue::new(
                IssueKind::VersionMismatch,
                Severity::Error,
                config_file,
                field,
                format!(
                    "Import file '{import}' not found for command '{name}'. This file is marked as optional but your Ahoy version doesn't support optional imports."
                ),
            )
            .gated("optional_imports", current)
            .suggest(format!(
                "Either upgrade Ahoy to {}+, create the missing file '{import}', or remove 'optional: true'",
                required_version("optional_imports").unwrap_or_default()
            )),
            (true, true) => Issue::new(
                IssueKind::MissingFile,
                Severity::Info,
                config_file,
                field,
                format!("Optional import file '{import}' not found for command '{name}' (this is OK)"),
            ),
            (false, _) => Issue::new(
                IssueKind::MissingFile,
                Severity::Warning,
                config_file,
                field,
                format!("Import file '{import}' not found for command '{name}' (will be skipped)"),
            )
            .suggest(format!(
                "Create the file '{import}' or mark the import as 'optional: true'"
            )),
        };
        issues.push(issue);
    }

    for env_path in &command.env {
        if !expand_path(env_path, config_dir).is_file() {
            issues.push(
                Issue::new(
                    IssueKind::MissingFile,
                    Severity::Warning,
                    config_file,
                    format!("commands.{name}.env"),
                    format!(
                        "Environment file '{env_path}' not found for command '{name}' (will be ignored)"
                    ),
                )
                .suggest(format!(
                    "Create the file '{env_path}' or remove it from the configuration"
                )),
            );
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> Config {
        Config::parse(yaml, Path::new(".ahoy.yml")).unwrap()
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("v2.1.0", "v2.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.1", "v2.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("v2.10.0", "v2.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("v2.0.9", "v2.1.0"), Ordering::Less);
        assert_eq!(compare_versions("v2.x.1", "v2.0.1"), Ordering::Equal);
        assert_eq!(compare_versions("v2.1.0.9", "v2.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("", "v0.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_version_supports() {
        assert!(version_supports("v2.2.0", "optional_imports"));
        assert!(version_supports("v2.3.1", "optional_imports"));
        assert!(!version_supports("v2.1.9", "optional_imports"));
        assert!(version_supports("development", "optional_imports"));
        assert!(version_supports("", "multiple_env_files"));
        assert!(version_supports("v1.0.0", "some_future_feature"));
    }

    #[test]
    fn test_clean_config_has_no_issues() {
        let result = validate_config(
            &config("ahoyapi: v2\ncommands:\n  hi:\n    cmd: echo hi\n"),
            Path::new(".ahoy.yml"),
            "v2.6.0",
        );
        assert!(result.issues.is_empty());
        assert!(!result.has_error);
    }

    #[test]
    fn test_api_version_mismatch_is_error() {
        let result = validate_config(&config("ahoyapi: v1\n"), Path::new(".ahoy.yml"), "v2.6.0");
        assert!(result.has_error);
        assert_eq!(result.issues[0].kind, IssueKind::VersionMismatch);
        assert_eq!(result.issues[0].field, "ahoyapi");
    }

    #[test]
    fn test_optional_on_old_version_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.yml"), "ahoyapi: v2\n").unwrap();
        let result = validate_config(
            &config("ahoyapi: v2\ncommands:\n  g:\n    optional: true\n    imports: [a.yml]\n"),
            &dir.path().join(".ahoy.yml"),
            "v2.1.0",
        );
        assert!(result.has_error);
        let issue = &result.issues[0];
        assert_eq!(issue.field, "commands.g.optional");
        assert_eq!(issue.feature, Some("optional_imports"));
        assert_eq!(issue.required_version, Some("v2.2.0"));
        assert_eq!(issue.current_version.as_deref(), Some("v2.1.0"));
    }

    #[test]
    fn test_aliases_on_old_version_is_warning() {
        let result = validate_config(
            &config("ahoyapi: v2\ncommands:\n  hi:\n    cmd: echo\n    aliases: [h]\n"),
            Path::new(".ahoy.yml"),
            "v2.0.0",
        );
        assert!(!result.has_error);
        assert_eq!(result.count(Severity::Warning), 1);
        assert_eq!(result.issues[0].feature, Some("command_aliases"));
    }

    #[test]
    fn test_missing_imports_by_optionality() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(".ahoy.yml");
        let yaml = "ahoyapi: v2\ncommands:\n  opt:\n    optional: true\n    imports: [nope.yml]\n  req:\n    imports: [nope.yml]\n";

        let current = validate_config(&config(yaml), &file, "v2.6.0");
        assert!(!current.has_error);
        let severities: Vec<_> = current.issues.iter().map(|i| (i.field.as_str(), i.severity)).collect();
        assert_eq!(
            severities,
            vec![
                ("commands.opt.imports", Severity::Info),
                ("commands.req.imports", Severity::Warning),
            ]
        );

        let old = validate_config(&config(yaml), &file, "v2.1.0");
        assert!(old.has_error);
        assert_eq!(old.count(Severity::Error), 2);
    }

    #[test]
    fn test_missing_env_files_are_warnings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.env"), "A=1\n").unwrap();
        let result = validate_config(
            &config(
                "ahoyapi: v2\nenv: [present.env, gone.env]\ncommands:\n  hi:\n    cmd: echo\n    env: missing.env\n",
            ),
            &dir.path().join(".ahoy.yml"),
            "v2.6.0",
        );
        assert!(!result.has_error);
        let fields: Vec<_> = result.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["env", "commands.hi.env"]);
        assert!(result.issues.iter().all(|i| i.kind == IssueKind::MissingFile));
    }

    #[test]
    fn test_multiple_env_files_on_old_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.env"), "").unwrap();
        std::fs::write(dir.path().join("b.env"), "").unwrap();
        let result = validate_config(
            &config("ahoyapi: v2\nenv: [a.env, b.env]\n"),
            &dir.path().join(".ahoy.yml"),
            "v2.4.0",
        );
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].feature, Some("multiple_env_files"));
        assert_eq!(result.issues[0].severity, Severity::Warning);
    }
}
