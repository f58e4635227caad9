use std::path::PathBuf;

use log::debug;

use crate::commands::entrypoint::build_argv;
use crate::env_file::{env_pairs, read_env_files};
use crate::exec::{ExecError, Executor, Invocation, RunOutcome};

/// A node of the resolved command tree
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    pub name: String,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub description: Option<String>,
    pub hide: bool,
    pub kind: CommandKind,
}

#[derive(Debug, Clone)]
pub enum CommandKind {
    /// Runs a shell snippet
    Action(CommandAction),
    /// Groups imported commands, sorted by name
    Group(Vec<ResolvedCommand>),
}

impl ResolvedCommand {
    /// All names this command answers to, primary name first
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    #[must_use]
    pub fn subcommands(&self) -> &[ResolvedCommand] {
        match &self.kind {
            CommandKind::Group(children) => children,
            CommandKind::Action(_) => &[],
        }
    }

    #[must_use]
    pub fn action(&self) -> Option<&CommandAction> {
        match &self.kind {
            CommandKind::Action(action) => Some(action),
            CommandKind::Group(_) => None,
        }
    }

    /// Find a direct child by name or alias
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ResolvedCommand> {
        find_command(self.subcommands(), name)
    }
}

/// Find a command in a sibling list by name or alias
#[must_use]
pub fn find_command<'a>(commands: &'a [ResolvedCommand], name: &str) -> Option<&'a ResolvedCommand> {
    commands
        .iter()
        .find(|c| c.name == name)
        .or_else(|| commands.iter().find(|c| c.aliases.iter().any(|a| a == name)))
}

/// An executable command with everything it needs captured by value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAction {
    pub name: String,
    pub cmd: String,
    pub entrypoint: Vec<String>,
    /// Directory of the config file that defined the command
    pub cwd: PathBuf,
    /// Env files in application order: config-wide first, then command-scoped
    pub env_files: Vec<PathBuf>,
    pub source: PathBuf,
}

impl CommandAction {
    /// Assemble the invocation for the given trailing arguments.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::EmptyEntrypoint` if the template has no program.
    pub fn invocation(&self, args: &[String]) -> Result<Invocation, ExecError> {
        if self.entrypoint.is_empty() {
            return Err(ExecError::EmptyEntrypoint(self.name.clone()));
        }
        let argv = build_argv(&self.entrypoint, &self.cmd, &self.name, args);
        let env = env_pairs(&read_env_files(&self.env_files));
        Ok(Invocation {
            argv,
            cwd: self.cwd.clone(),
            env,
        })
    }

    /// Run the command with the given trailing arguments.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the invocation can't be built or started.
    pub fn run(&self, args: &[String], executor: &dyn Executor) -> Result<RunOutcome, ExecError> {
        let invocation = self.invocation(args)?;
        debug!(
            "===> ahoy {} from {}: {:?}",
            self.name,
            self.source.display(),
            invocation.argv
        );
        executor.execute(&invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(name: &str, cmd: &str, cwd: PathBuf) -> CommandAction {
        CommandAction {
            name: name.to_string(),
            cmd: cmd.to_string(),
            entrypoint: vec!["bash".into(), "-c".into(), "{{cmd}}".into(), "{{name}}".into()],
            cwd,
            env_files: Vec::new(),
            source: PathBuf::from(".ahoy.yml"),
        }
    }

    #[test]
    fn test_invocation_uses_config_dir_and_env_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("global.env"), "A=1\nB=1\n").unwrap();
        std::fs::write(dir.path().join("cmd.env"), "A=2\n").unwrap();
        let mut action = action("greet", "echo hi", dir.path().to_path_buf());
        action.env_files = vec![dir.path().join("global.env"), dir.path().join("cmd.env")];

        let inv = action.invocation(&["world".to_string()]).unwrap();
        assert_eq!(inv.argv, vec!["bash", "-c", "echo hi", "greet", "world"]);
        assert_eq!(inv.cwd, dir.path());
        assert_eq!(
            inv.env,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "1".to_string()),
                ("A".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_entrypoint_is_rejected() {
        let mut action = action("x", "echo", PathBuf::from("."));
        action.entrypoint.clear();
        assert!(matches!(
            action.invocation(&[]),
            Err(ExecError::EmptyEntrypoint(name)) if name == "x"
        ));
    }

    #[test]
    fn test_find_by_alias() {
        let commands = vec![ResolvedCommand {
            name: "build".into(),
            aliases: vec!["b".into()],
            usage: None,
            description: None,
            hide: false,
            kind: CommandKind::Action(action("build", "make", PathBuf::from("."))),
        }];
        assert_eq!(find_command(&commands, "b").map(|c| c.name.as_str()), Some("build"));
        assert!(find_command(&commands, "c").is_none());
    }
}
