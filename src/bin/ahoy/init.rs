use std::process::ExitCode;

use ahoy::context::RunContext;
use ahoy::init::{InitArgs, UreqFetcher};

/// Download an example or custom `.ahoy.yml` into the working directory.
///
/// # Errors
///
/// Returns an error if the download or the write fails.
pub fn run(args: &InitArgs, ctx: &RunContext) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    ahoy::init::run(args, &ctx.cwd, &UreqFetcher, &mut stdin.lock())?;
    Ok(ExitCode::SUCCESS)
}
