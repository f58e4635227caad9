use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::config_file::FILENAME;

/// Example config downloaded when no URL is given
pub const DEFAULT_EXAMPLE_URL: &str =
    "https://raw.githubusercontent.com/ahoy-cli/ahoy/master/examples/examples.ahoy.yml";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum InitError {
    #[error("failed to fetch URL {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to download {url}: server returned {status} {text}")]
    Status { url: String, status: u16, text: String },

    #[error("failed to read response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input: {0}")]
    Input(#[source] std::io::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    pub url: Option<String>,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Written(PathBuf),
    /// An existing config was kept because the overwrite wasn't confirmed
    Aborted,
}

/// Source of the config body for `init`.
pub trait Fetcher {
    /// Download `url` as text.
    ///
    /// # Errors
    ///
    /// Returns `InitError::Fetch` or `InitError::Status` on failure.
    fn fetch(&self, url: &str) -> Result<String, InitError>;
}

/// Blocking HTTP download.
#[derive(Debug, Default, Clone, Copy)]
pub struct UreqFetcher;

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<String, InitError> {
        let agent = ureq::AgentBuilder::new().timeout(DOWNLOAD_TIMEOUT).build();
        match agent.get(url).call() {
            Ok(response) => response.into_string().map_err(|e| InitError::Body {
                url: url.to_string(),
                source: e,
            }),
            Err(ureq::Error::Status(status, response)) => Err(InitError::Status {
                url: url.to_string(),
                status,
                text: response.status_text().to_string(),
            }),
            Err(e) => Err(InitError::Fetch {
                url: url.to_string(),
                source: Box::new(e),
            }),
        }
    }
}

/// Write a `.ahoy.yml` into `cwd` from `args.url` or the default example.
///
/// When a config already exists and `force` isn't set, the user is asked to
/// confirm on `input`; anything other than `y`/`Y` leaves the file alone.
///
/// # Errors
///
/// Returns `InitError` if reading the answer, downloading, or writing fails.
pub fn run(
    args: &InitArgs,
    cwd: &Path,
    fetcher: &dyn Fetcher,
    input: &mut dyn BufRead,
) -> Result<InitOutcome, InitError> {
    let target = cwd.join(FILENAME);
    if target.is_file() {
        if args.force {
            println!("Warning: '--force' parameter passed, overwriting {FILENAME} in current directory.");
        } else {
            println!("Warning: {FILENAME} found in current directory.");
            eprint!("Are you sure you wish to overwrite it with an example file, y/N ? ");
            let _ = std::io::stderr().flush();
            let mut answer = String::new();
            input.read_line(&mut answer).map_err(InitError::Input)?;
            if !matches!(answer.trim_start().chars().next(), Some('y' | 'Y')) {
                println!("Abort: exiting without overwriting.");
                return Ok(InitOutcome::Aborted);
            }
            if args.url.is_some() {
                println!("Ok, overwriting {FILENAME} in current directory with specified file.");
            } else {
                println!("Ok, overwriting {FILENAME} in current directory with example file.");
            }
        }
    }

    let url = args.url.as_deref().unwrap_or(DEFAULT_EXAMPLE_URL);
    debug!("Downloading {url} to {}", target.display());
    let body = fetcher.fetch(url)?;
    std::fs::write(&target, body).map_err(|e| InitError::Write {
        path: target.clone(),
        source: e,
    })?;

    if args.url.is_some() {
        println!("Your specified {FILENAME} has been downloaded to the current directory.");
    } else {
        println!(
            "Example {FILENAME} downloaded to the current directory. You can customize it to suit your needs!"
        );
    }
    Ok(InitOutcome::Written(target))
}
