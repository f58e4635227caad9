//! Command-line surface built from the resolved command tree
//!
//! Global flags are read twice: once by [`GlobalArgs`] before any config is
//! loaded (the config path and verbosity decide what gets loaded), and again
//! by the full tree from [`build_cli`] so they show up in help output.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Arg, ArgAction, ArgMatches, Command, Parser, Subcommand, value_parser};
use log::debug;

use crate::commands::command::{CommandAction, CommandKind, ResolvedCommand, find_command};
use crate::init::InitArgs;

const DEFAULT_ABOUT: &str = "Creates a configurable cli app for running commands.";

const FILE: &str = "file";
const VERBOSE: &str = "verbose";
const BASH_COMPLETION: &str = "generate-bash-completion";
const ARGS: &str = "args";
const URL: &str = "url";
const FORCE: &str = "force";

const INIT: &str = "init";
const VALIDATE: &str = "validate";
const CONFIG: &str = "config";
const HELP: &str = "help";

/// Flags that must be known before the config is loaded
#[derive(Parser, Debug, Default)]
#[command(
    name = "ahoy",
    disable_help_flag = true,
    disable_version_flag = true,
    ignore_errors = true
)]
pub struct GlobalArgs {
    /// Use a specific ahoy file
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Output extra details like the commands to be run
    #[arg(short, long, env = "AHOY_VERBOSE", value_parser = BoolishValueParser::new())]
    pub verbose: bool,

    #[arg(long = "generate-bash-completion", hide = true)]
    pub generate_bash_completion: bool,

    #[command(subcommand)]
    pub command: Option<Requested>,
}

#[derive(Subcommand, Debug)]
pub enum Requested {
    #[command(external_subcommand)]
    External(Vec<String>),
}

impl GlobalArgs {
    /// Parse global flags from the raw arguments, ignoring anything else.
    pub fn parse_lenient<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        GlobalArgs::try_parse_from(args).unwrap_or_default()
    }

    /// Command words after the global flags
    #[must_use]
    pub fn requested(&self) -> &[String] {
        match &self.command {
            Some(Requested::External(words)) => words,
            None => &[],
        }
    }

    /// Whether the invocation asks for the built-in config report.
    ///
    /// Used to still produce a report when the config fails to load.
    #[must_use]
    pub fn wants_validate(&self) -> bool {
        match self.requested() {
            [first, ..] if first == VALIDATE => true,
            [first, second, ..] => first == CONFIG && second == VALIDATE,
            _ => false,
        }
    }
}

/// What the parsed command line asks for
#[derive(Debug)]
pub enum Dispatch<'a> {
    Run {
        action: &'a CommandAction,
        args: Vec<String>,
    },
    Init(InitArgs),
    Validate,
    Completion,
    /// No command was given
    Missing,
}

/// Build the full clap tree: global flags, the resolved commands, and the
/// built-ins whose names the config doesn't already use.
#[must_use]
pub fn build_cli(commands: &[ResolvedCommand], usage: Option<&str>) -> Command {
    let mut app = Command::new("ahoy")
        .version(env!("CARGO_PKG_VERSION"))
        .about(usage.unwrap_or(DEFAULT_ABOUT).to_string())
        .arg(
            Arg::new(FILE)
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Use a specific ahoy file"),
        )
        .arg(
            Arg::new(VERBOSE)
                .short('v')
                .long("verbose")
                .env("AHOY_VERBOSE")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new())
                .help("Output extra details like the commands to be run"),
        )
        .arg(
            Arg::new(BASH_COMPLETION)
                .long(BASH_COMPLETION)
                .action(ArgAction::SetTrue)
                .hide(true),
        );

    app = with_children(app, commands);
    for builtin in builtins(commands) {
        app = app.subcommand(builtin);
    }
    app
}

/// Add `commands` as subcommands of `parent`.
///
/// Sibling names and aliases share one namespace: every primary name is
/// reserved first, then aliases that would clash with a name or an earlier
/// alias are dropped. A command named `help` replaces clap's own.
fn with_children(parent: Command, commands: &[ResolvedCommand]) -> Command {
    let mut taken: HashSet<String> = commands.iter().map(|c| c.name.clone()).collect();
    let mut parent = parent;
    for command in commands {
        let aliases = unique_aliases(command, &mut taken);
        parent = parent.subcommand(command_node(command, aliases));
    }
    if taken.contains(HELP) {
        parent = parent.disable_help_subcommand(true);
    }
    parent
}

fn unique_aliases(command: &ResolvedCommand, taken: &mut HashSet<String>) -> Vec<String> {
    command
        .aliases
        .iter()
        .filter(|alias| {
            let fresh = taken.insert((*alias).clone());
            if !fresh {
                debug!("Ignoring alias [{alias}] of [{}], the name is already taken", command.name);
            }
            fresh
        })
        .cloned()
        .collect()
}

fn command_node(command: &ResolvedCommand, aliases: Vec<String>) -> Command {
    let mut node = Command::new(command.name.clone())
        .visible_aliases(aliases)
        .hide(command.hide);
    if let Some(usage) = &command.usage {
        node = node.about(usage.clone());
    }
    if let Some(description) = &command.description {
        node = node.long_about(description.clone());
    }

    match &command.kind {
        CommandKind::Action(_) => node.disable_help_flag(true).arg(
            Arg::new(ARGS)
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .value_parser(value_parser!(String)),
        ),
        CommandKind::Group(children) => with_children(
            node.arg_required_else_help(true).subcommand_required(true),
            children,
        ),
    }
}

fn init_command() -> Command {
    Command::new(INIT)
        .about("Initialize a new .ahoy.yml config file in the current directory.")
        .arg(
            Arg::new(URL)
                .value_name("URL")
                .help("Download the config from this URL instead of the example"),
        )
        .arg(
            Arg::new(FORCE)
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Force overwriting the .ahoy.yml file in the current directory."),
        )
}

fn validate_command() -> Command {
    Command::new(VALIDATE).about("Validate the configuration and report problems")
}

fn builtins(commands: &[ResolvedCommand]) -> Vec<Command> {
    let mut builtins = Vec::new();
    if find_command(commands, INIT).is_none() {
        builtins.push(init_command());
    }
    if find_command(commands, VALIDATE).is_none() {
        builtins.push(validate_command());
    }
    if find_command(commands, CONFIG).is_none() {
        builtins.push(
            Command::new(CONFIG)
                .about("Manage the ahoy configuration")
                .arg_required_else_help(true)
                .subcommand_required(true)
                .subcommand(validate_command())
                .subcommand(init_command()),
        );
    }
    builtins
}

/// Map parsed matches back onto the command tree.
#[must_use]
pub fn dispatch<'a>(commands: &'a [ResolvedCommand], matches: &ArgMatches) -> Dispatch<'a> {
    if matches.get_flag(BASH_COMPLETION) {
        return Dispatch::Completion;
    }
    let Some((name, sub)) = matches.subcommand() else {
        return Dispatch::Missing;
    };
    if let Some(command) = find_command(commands, name) {
        return resolve(command, sub);
    }
    match name {
        INIT => Dispatch::Init(init_args(sub)),
        VALIDATE => Dispatch::Validate,
        CONFIG => match sub.subcommand() {
            Some((VALIDATE, _)) => Dispatch::Validate,
            Some((INIT, init)) => Dispatch::Init(init_args(init)),
            _ => Dispatch::Missing,
        },
        _ => Dispatch::Missing,
    }
}

fn resolve<'a>(command: &'a ResolvedCommand, matches: &ArgMatches) -> Dispatch<'a> {
    match &command.kind {
        CommandKind::Action(action) => Dispatch::Run {
            action,
            args: matches
                .get_many::<String>(ARGS)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        },
        CommandKind::Group(_) => match matches.subcommand() {
            Some((name, sub)) => command
                .find(name)
                .map_or(Dispatch::Missing, |child| resolve(child, sub)),
            None => Dispatch::Missing,
        },
    }
}

fn init_args(matches: &ArgMatches) -> InitArgs {
    InitArgs {
        url: matches.get_one::<String>(URL).cloned(),
        force: matches.get_flag(FORCE),
    }
}

/// Top-level names and visible aliases for shell completion
#[must_use]
pub fn completion_names(app: &Command) -> Vec<String> {
    app.get_subcommands()
        .filter(|c| !c.is_hide_set())
        .filter(|c| c.get_name() != HELP || app.is_disable_help_subcommand_set())
        .flat_map(|c| std::iter::once(c.get_name()).chain(c.get_visible_aliases()))
        .map(str::to_string)
        .collect()
}
