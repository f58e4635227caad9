//! The `validate` report: a full diagnostic pass over a config file without
//! running anything.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anstyle::{AnsiColor, Reset, Style};

use crate::config_file::{Config, SUPPORTED_API_VERSION, expand_path};
use crate::context::RunContext;
use crate::validation::{IssueKind, Severity, ValidationResult, validate_config};

const SUCCESS_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)));
const ERROR_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)));
const WARNING_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Yellow)));
const INFO_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Blue)));
const HEADING: Style = Style::new().bold();

pub const RECOMMEND_INIT: &str = "Create a .ahoy.yml file using 'ahoy init'";
pub const RECOMMEND_READ: &str = "Check that the configuration file is readable and UTF-8 encoded";
pub const RECOMMEND_FIX_YAML: &str = "Fix YAML syntax errors in configuration file";
pub const RECOMMEND_UPGRADE: &str = "Upgrade Ahoy to the latest version for full feature support";
pub const RECOMMEND_IMPORTS: &str = "Create missing import files or mark them as optional";
pub const RECOMMEND_ENV: &str =
    "Consider creating missing environment files or removing them from configuration";
pub const RECOMMEND_NEWER: &str =
    "Consider upgrading to a newer Ahoy version for better support of advanced features";
pub const RECOMMEND_NONE: &str = "Configuration looks good! No issues found.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFileStatus {
    pub path: String,
    pub exists: bool,
    pub global: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFileStatus {
    pub path: String,
    pub exists: bool,
    pub optional: bool,
    pub command: String,
}

/// Everything `ahoy validate` knows about a config file
#[derive(Debug, Clone, Default)]
pub struct ConfigReport {
    pub config_file: PathBuf,
    pub config_exists: bool,
    /// The file parsed as YAML matching the schema
    pub config_valid: bool,
    /// Why an existing file couldn't be read
    pub read_error: Option<String>,
    pub api_version: String,
    pub tool_version: String,
    pub validation: ValidationResult,
    pub env_files: Vec<EnvFileStatus>,
    pub import_files: Vec<ImportFileStatus>,
    pub recommendations: Vec<String>,
}

/// Run every diagnostic over `config_file`.
///
/// Unlike a normal load, a wrong API version or a YAML error ends up in the
/// report instead of failing.
#[must_use]
pub fn run_config_validate(config_file: &Path, ctx: &RunContext) -> ConfigReport {
    let mut report = ConfigReport {
        config_file: config_file.to_path_buf(),
        tool_version: ctx.tool_version.clone(),
        ..Default::default()
    };

    report.config_exists = config_file.is_file();
    if !report.config_exists {
        report.recommendations.push(RECOMMEND_INIT.to_string());
        return report;
    }

    let contents = match std::fs::read_to_string(config_file) {
        Ok(contents) => contents,
        Err(e) => {
            report.read_error = Some(e.to_string());
            report.recommendations.push(RECOMMEND_READ.to_string());
            return report;
        }
    };
    let Ok(config) = Config::parse(&contents, config_file) else {
        report.recommendations.push(RECOMMEND_FIX_YAML.to_string());
        return report;
    };

    report.config_valid = true;
    report.api_version.clone_from(&config.ahoyapi);
    report.validation = validate_config(&config, config_file, &ctx.tool_version);

    let config_dir = config_file.parent().unwrap_or(Path::new("."));
    report.env_files = env_file_statuses(&config, config_dir);
    report.import_files = import_file_statuses(&config, config_dir);
    report.recommendations = recommendations(&report);
    report
}

fn env_file_statuses(config: &Config, config_dir: &Path) -> Vec<EnvFileStatus> {
    let global = config.env.iter().map(|path| (path, true));
    let scoped = config
        .commands
        .values()
        .flat_map(|cmd| cmd.env.iter().map(|path| (path, false)));
    global
        .chain(scoped)
        .map(|(path, global)| EnvFileStatus {
            path: path.clone(),
            exists: expand_path(path, config_dir).is_file(),
            global,
        })
        .collect()
}

fn import_file_statuses(config: &Config, config_dir: &Path) -> Vec<ImportFileStatus> {
    config
        .commands
        .iter()
        .flat_map(|(name, cmd)| {
            cmd.imports
                .iter()
                .flatten()
                .filter(|path| !path.is_empty())
                .map(move |path| ImportFileStatus {
                    path: path.clone(),
                    exists: expand_path(path, config_dir).is_file(),
                    optional: cmd.optional,
                    command: name.clone(),
                })
        })
        .collect()
}

fn recommendations(report: &ConfigReport) -> Vec<String> {
    let issues = &report.validation.issues;
    let mismatch = |severity| {
        issues
            .iter()
            .any(|i| i.kind == IssueKind::VersionMismatch && i.severity == severity)
    };

    let mut recs = Vec::new();
    if mismatch(Severity::Error) {
        recs.push(RECOMMEND_UPGRADE);
    }
    if report.import_files.iter().any(|i| !i.exists && !i.optional) {
        recs.push(RECOMMEND_IMPORTS);
    }
    if report.env_files.iter().any(|e| !e.exists) {
        recs.push(RECOMMEND_ENV);
    }
    if mismatch(Severity::Warning) {
        recs.push(RECOMMEND_NEWER);
    }
    if issues.is_empty() && recs.is_empty() {
        recs.push(RECOMMEND_NONE);
    }
    recs.into_iter().map(ToString::to_string).collect()
}

/// Applies terminal styling only when enabled.
struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, style: Style, s: &str) -> String {
        if self.color {
            format!("{style}{s}{Reset}")
        } else {
            s.to_string()
        }
    }

    fn ok(&self) -> String {
        self.paint(SUCCESS_COLOR, "✓")
    }

    fn fail(&self) -> String {
        self.paint(ERROR_COLOR, "✘")
    }

    fn severity(&self, severity: Severity) -> String {
        match severity {
            Severity::Error => self.fail(),
            Severity::Warning => self.paint(WARNING_COLOR, "!"),
            Severity::Info => self.paint(INFO_COLOR, "i"),
        }
    }
}

impl ConfigReport {
    /// Render the human-readable report.
    #[must_use]
    pub fn render(&self, color: bool) -> String {
        let p = Palette { color };
        let mut out = String::new();
        let _ = writeln!(out, "{}", p.paint(HEADING, "Ahoy Configuration Validator"));
        let _ = writeln!(out, "============================");
        let _ = writeln!(out);

        let _ = write!(out, "Configuration file: {} ", self.config_file.display());
        if !self.config_exists {
            let _ = writeln!(out, "{} (not found)", p.fail());
            let _ = writeln!(out);
            let _ = writeln!(out, "Run 'ahoy init' to create a new configuration file");
            return out;
        }
        let _ = writeln!(out, "{} (found)", p.ok());

        if self.config_valid {
            let supported = self.api_version == SUPPORTED_API_VERSION;
            let _ = writeln!(
                out,
                "API version: {} {}",
                self.api_version,
                if supported {
                    format!("{} (supported)", p.ok())
                } else {
                    format!("{} (unsupported)", p.fail())
                }
            );
        }
        let _ = writeln!(out, "Ahoy version: {}", self.tool_version);
        if let Some(error) = &self.read_error {
            let _ = writeln!(out, "Syntax: {} unreadable ({error})", p.fail());
        } else if self.config_valid {
            let _ = writeln!(out, "Syntax: {} valid YAML", p.ok());
        } else {
            let _ = writeln!(out, "Syntax: {} invalid YAML", p.fail());
        }
        let _ = writeln!(out);

        self.render_issues(&p, &mut out);
        self.render_files(&p, &mut out);

        if !self.recommendations.is_empty() {
            let _ = writeln!(out, "{}", p.paint(HEADING, "Recommendations:"));
            for (i, rec) in self.recommendations.iter().enumerate() {
                let _ = writeln!(out, "{}. {rec}", i + 1);
            }
            let _ = writeln!(out);
        }

        let summary = if !self.config_valid || self.validation.has_error {
            format!("{} Configuration has errors that need to be fixed", p.fail())
        } else if self.validation.issues.is_empty() {
            format!("{} Configuration looks great!", p.ok())
        } else {
            format!(
                "{} Configuration has warnings but should work",
                p.severity(Severity::Warning)
            )
        };
        let _ = writeln!(out, "{summary}");
        out
    }

    fn render_issues(&self, p: &Palette, out: &mut String) {
        if !self.config_valid {
            return;
        }
        if self.validation.issues.is_empty() {
            let _ = writeln!(out, "{} No validation issues found", p.ok());
            let _ = writeln!(out);
            return;
        }
        let _ = writeln!(out, "{}", p.paint(HEADING, "Issues found:"));
        let _ = writeln!(out);
        for (i, issue) in self.validation.issues.iter().enumerate() {
            let _ = writeln!(out, "{}. {} {}", i + 1, p.severity(issue.severity), issue.message);
            if !issue.field.is_empty() {
                let _ = writeln!(out, "   Location: {}", issue.field);
            }
            if let Some(required) = issue.required_version {
                let _ = writeln!(
                    out,
                    "   Required version: {required} (current: {})",
                    issue.current_version.as_deref().unwrap_or_default()
                );
            }
            if let Some(ref suggestion) = issue.suggestion {
                let _ = writeln!(out, "   Fix: {suggestion}");
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(
            out,
            "Summary: {} error(s), {} warning(s), {} info",
            self.validation.count(Severity::Error),
            self.validation.count(Severity::Warning),
            self.validation.count(Severity::Info)
        );
        let _ = writeln!(out);
    }

    fn render_files(&self, p: &Palette, out: &mut String) {
        if !self.env_files.is_empty() {
            let _ = writeln!(out, "{}", p.paint(HEADING, "Environment files:"));
            for env in &self.env_files {
                let scope = if env.global { "global" } else { "command-specific" };
                if env.exists {
                    let _ = writeln!(out, "   {} {} ({scope})", p.ok(), env.path);
                } else {
                    let _ = writeln!(out, "   {} {} ({scope}) - missing", p.fail(), env.path);
                }
            }
            let _ = writeln!(out);
        }

        if !self.import_files.is_empty() {
            let _ = writeln!(out, "{}", p.paint(HEADING, "Import files:"));
            for import in &self.import_files {
                let status = if import.optional { "optional" } else { "required" };
                let detail = format!("{} ({status}, command: {})", import.path, import.command);
                if import.exists {
                    let _ = writeln!(out, "   {} {detail}", p.ok());
                } else if import.optional {
                    let _ = writeln!(
                        out,
                        "   {} {detail} - missing but OK",
                        p.severity(Severity::Warning)
                    );
                } else {
                    let _ = writeln!(out, "   {} {detail} - missing", p.fail());
                }
            }
            let _ = writeln!(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Issue;

    fn ctx(dir: &Path) -> RunContext {
        RunContext::new(dir.to_path_buf()).with_tool_version("v2.6.0")
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_config_validate(&dir.path().join(".ahoy.yml"), &ctx(dir.path()));
        assert!(!report.config_exists);
        assert!(!report.config_valid);
        assert_eq!(report.recommendations, vec![RECOMMEND_INIT]);
        assert!(report.render(false).contains("(not found)"));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ahoy.yml");
        std::fs::write(&path, "ahoyapi: v2\ncommands: [oops\n").unwrap();
        let report = run_config_validate(&path, &ctx(dir.path()));
        assert!(report.config_exists);
        assert!(!report.config_valid);
        assert_eq!(report.recommendations, vec![RECOMMEND_FIX_YAML]);
        assert!(
            report
                .render(false)
                .ends_with("Configuration has errors that need to be fixed\n")
        );
    }

    #[test]
    fn test_unreadable_config_is_not_a_yaml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ahoy.yml");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x61]).unwrap();
        let report = run_config_validate(&path, &ctx(dir.path()));
        assert!(report.config_exists);
        assert!(!report.config_valid);
        assert!(report.read_error.is_some());
        assert_eq!(report.recommendations, vec![RECOMMEND_READ]);
        let rendered = report.render(false);
        assert!(rendered.contains("Syntax: ✘ unreadable ("));
        assert!(!rendered.contains("invalid YAML"));
    }

    #[test]
    fn test_clean_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ahoy.yml");
        std::fs::write(&path, "ahoyapi: v2\ncommands:\n  hi:\n    cmd: echo hi\n").unwrap();
        let report = run_config_validate(&path, &ctx(dir.path()));
        assert!(report.config_valid);
        assert_eq!(report.api_version, "v2");
        assert_eq!(report.recommendations, vec![RECOMMEND_NONE]);
        assert!(report.render(false).ends_with("Configuration looks great!\n"));
    }

    #[test]
    fn test_wrong_api_version_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ahoy.yml");
        std::fs::write(&path, "ahoyapi: v1\ncommands:\n  hi:\n    cmd: echo hi\n").unwrap();
        let report = run_config_validate(&path, &ctx(dir.path()));
        assert!(report.config_valid);
        assert!(report.validation.has_error);
        assert_eq!(report.recommendations, vec![RECOMMEND_UPGRADE]);
        assert!(report.render(false).contains("API version: v1 ✘ (unsupported)"));
    }

    #[test]
    fn test_file_statuses_and_recommendations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".ahoy.yml");
        std::fs::write(dir.path().join("present.yml"), "ahoyapi: v2\n").unwrap();
        std::fs::write(
            &path,
            "ahoyapi: v2\nenv: .env\ncommands:\n  a:\n    imports: [present.yml, absent.yml]\n  b:\n    optional: true\n    imports: [private.yml]\n",
        )
        .unwrap();
        let report = run_config_validate(&path, &ctx(dir.path()));

        assert_eq!(
            report.env_files,
            vec![EnvFileStatus {
                path: ".env".into(),
                exists: false,
                global: true
            }]
        );
        let imports: Vec<_> = report
            .import_files
            .iter()
            .map(|i| (i.path.as_str(), i.exists, i.optional, i.command.as_str()))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("present.yml", true, false, "a"),
                ("absent.yml", false, false, "a"),
                ("private.yml", false, true, "b"),
            ]
        );
        assert_eq!(report.recommendations, vec![RECOMMEND_IMPORTS, RECOMMEND_ENV]);
    }

    #[test]
    fn test_render_snapshot() {
        let report = ConfigReport {
            config_file: PathBuf::from("/project/.ahoy.yml"),
            config_exists: true,
            config_valid: true,
            read_error: None,
            api_version: "v2".into(),
            tool_version: "v2.1.0".into(),
            validation: ValidationResult {
                issues: vec![Issue {
                    kind: IssueKind::VersionMismatch,
                    severity: Severity::Error,
                    message: "Command 'db' uses 'optional: true' which requires Ahoy v2.2.0 or later"
                        .into(),
                    file: PathBuf::from("/project/.ahoy.yml"),
                    field: "commands.db.optional".into(),
                    feature: Some("optional_imports"),
                    required_version: Some("v2.2.0"),
                    current_version: Some("v2.1.0".into()),
                    suggestion: Some("Upgrade Ahoy or remove 'optional: true' from the command".into()),
                }],
                has_error: true,
            },
            env_files: vec![EnvFileStatus {
                path: ".env".into(),
                exists: true,
                global: true,
            }],
            import_files: vec![ImportFileStatus {
                path: "db.ahoy.yml".into(),
                exists: false,
                optional: true,
                command: "db".into(),
            }],
            recommendations: vec![RECOMMEND_UPGRADE.into()],
        };

        insta::assert_snapshot!(report.render(false), @r"
        Ahoy Configuration Validator
        ============================

        Configuration file: /project/.ahoy.yml ✓ (found)
        API version: v2 ✓ (supported)
        Ahoy version: v2.1.0
        Syntax: ✓ valid YAML

        Issues found:

        1. ✘ Command 'db' uses 'optional: true' which requires Ahoy v2.2.0 or later
           Location: commands.db.optional
           Required version: v2.2.0 (current: v2.1.0)
           Fix: Upgrade Ahoy or remove 'optional: true' from the command

        Summary: 1 error(s), 0 warning(s), 0 info

        Environment files:
           ✓ .env (global)

        Import files:
           ! db.ahoy.yml (optional, command: db) - missing but OK

        Recommendations:
        1. Upgrade Ahoy to the latest version for full feature support

        ✘ Configuration has errors that need to be fixed
        ");
    }
}
