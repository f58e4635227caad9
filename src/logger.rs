use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes `[level] message` lines to stderr.
struct AhoyLogger {
    filter: LevelFilter,
}

impl Log for AhoyLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{}] {}",
            level_label(record.level()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

/// Level used when `RUST_LOG` doesn't say otherwise
#[must_use]
pub fn default_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

/// Initialize the global logger. Later calls are ignored.
pub fn init(verbose: bool) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| default_filter(verbose));

    if log::set_boxed_logger(Box::new(AhoyLogger { filter })).is_ok() {
        log::set_max_level(filter);
    }
}

/// Print a fatal error in the same format as log lines.
pub fn fatal(message: impl std::fmt::Display) {
    let _ = writeln!(std::io::stderr().lock(), "[fatal] {message}");
}
