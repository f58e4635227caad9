//! Subprocess execution for resolved commands

use std::path::PathBuf;
use std::process::Command as ProcessCommand;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("command [{0}] has an empty entrypoint, nothing to execute")]
    EmptyEntrypoint(String),
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything needed to start one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program followed by its arguments
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    /// Overlay applied on top of the ambient environment, in order
    pub env: Vec<(String, String)>,
}

/// Result of a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl RunOutcome {
    #[must_use]
    pub fn success() -> Self {
        RunOutcome {
            success: true,
            exit_code: Some(0),
        }
    }
}

/// Something that can run an `Invocation` to completion.
pub trait Executor {
    /// Run the invocation and wait for it.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the process could not be started.
    fn execute(&self, invocation: &Invocation) -> Result<RunOutcome, ExecError>;
}

/// Runs commands as child processes with inherited stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<RunOutcome, ExecError> {
        let Some((program, args)) = invocation.argv.split_first() else {
            return Err(ExecError::EmptyEntrypoint(String::new()));
        };
        let status = ProcessCommand::new(program)
            .args(args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .status()
            .map_err(|e| ExecError::Spawn {
                program: program.clone(),
                source: e,
            })?;
        Ok(RunOutcome {
            success: status.success(),
            exit_code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(argv: &[&str], cwd: PathBuf) -> Invocation {
        Invocation {
            argv: argv.iter().map(ToString::to_string).collect(),
            cwd,
            env: Vec::new(),
        }
    }

    #[test]
    fn test_exit_status_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ok = ProcessExecutor
            .execute(&invocation(&["sh", "-c", "exit 0"], dir.path().to_path_buf()))
            .unwrap();
        assert!(ok.success);

        let failed = ProcessExecutor
            .execute(&invocation(&["sh", "-c", "exit 3"], dir.path().to_path_buf()))
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(3));
    }

    #[test]
    fn test_later_env_entries_win() {
        let dir = tempfile::tempdir().unwrap();
        let mut inv = invocation(
            &["sh", "-c", "printf %s \"$A\" > out.txt"],
            dir.path().to_path_buf(),
        );
        inv.env = vec![("A".into(), "1".into()), ("A".into(), "2".into())];
        ProcessExecutor.execute(&inv).unwrap();
        let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(out, "2");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProcessExecutor.execute(&invocation(
            &["definitely-not-a-real-program-ahoy"],
            dir.path().to_path_buf(),
        ));
        assert!(matches!(result, Err(ExecError::Spawn { .. })));
    }
}
