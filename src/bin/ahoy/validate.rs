use std::io::IsTerminal;
use std::process::ExitCode;

use ahoy::config_file::{FILENAME, find_config};
use ahoy::context::RunContext;
use ahoy::report::run_config_validate;

/// Print the diagnostic report for the active config.
///
/// Problems in the config, including a missing file, are part of the report
/// and never fail the command.
pub fn run(ctx: &RunContext) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let path = ctx
        .explicit_config()
        .or_else(|| find_config(&ctx.cwd))
        .unwrap_or_else(|| ctx.cwd.join(FILENAME));
    let report = run_config_validate(&path, ctx);
    print!("{}", report.render(std::io::stdout().is_terminal()));
    Ok(ExitCode::SUCCESS)
}
