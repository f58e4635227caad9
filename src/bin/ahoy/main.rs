mod init;
mod validate;

use std::ffi::OsString;
use std::process::ExitCode;

use clap::error::ErrorKind;
use log::{debug, error, warn};

use ahoy::cli::{self, Dispatch, GlobalArgs};
use ahoy::context::RunContext;
use ahoy::exec::ProcessExecutor;
use ahoy::{load_commands, logger};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            logger::fatal(e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args: Vec<OsString> = std::env::args_os().collect();
    let globals = GlobalArgs::parse_lenient(&args);

    // The report lists validation problems itself
    let ctx = RunContext::new(std::env::current_dir()?)
        .with_source_file(globals.file.clone())
        .with_verbose(globals.verbose)
        .with_skip_validation(globals.wants_validate());
    logger::init(ctx.verbose);

    let loaded = match load_commands(&ctx) {
        Ok(loaded) => loaded,
        Err(e) if globals.wants_validate() => {
            debug!("Config failed to load, reporting on it instead: {e}");
            return validate::run(&ctx);
        }
        Err(e) => return Err(e.into()),
    };

    let (commands, usage) = match &loaded {
        Some(loaded) => (loaded.commands.as_slice(), loaded.config.usage.as_deref()),
        None => (&[][..], None),
    };

    let mut app = cli::build_cli(commands, usage);
    let matches = match app.try_get_matches_from_mut(&args) {
        Ok(matches) => matches,
        Err(e) => {
            let _ = e.print();
            return Ok(match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            });
        }
    };

    match cli::dispatch(commands, &matches) {
        Dispatch::Run { action, args } => {
            let outcome = action.run(&args, &ProcessExecutor)?;
            if outcome.success {
                Ok(ExitCode::SUCCESS)
            } else {
                debug!("Command [{}] exited with {:?}", action.name, outcome.exit_code);
                eprintln!();
                Ok(ExitCode::FAILURE)
            }
        }
        Dispatch::Init(args) => init::run(&args, &ctx),
        Dispatch::Validate => validate::run(&ctx),
        Dispatch::Completion => {
            for name in cli::completion_names(&app) {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Dispatch::Missing => {
            app.print_help()?;
            if loaded.is_none() {
                error!("No .ahoy.yml found. You can use 'ahoy init' to download an example.");
            }
            warn!("Missing flag or argument.");
            Ok(ExitCode::FAILURE)
        }
    }
}
