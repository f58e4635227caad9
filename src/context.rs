use std::path::{Path, PathBuf};

/// Process-wide settings resolved once at startup.
///
/// Everything that used to be ambient state (the selected config file, the
/// verbosity flag, the working directory) lives here and is handed down by
/// reference to the resolver, loader and tree builder.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub cwd: PathBuf,
    /// Explicit config path from `-f/--file`, if any
    pub source_file: Option<PathBuf>,
    pub verbose: bool,
    /// Version used to gate features in the validation engine
    pub tool_version: String,
    /// Skip the validation engine while loading (diagnostic flows)
    pub skip_validation: bool,
}

impl RunContext {
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        RunContext {
            cwd,
            source_file: None,
            verbose: false,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            skip_validation: false,
        }
    }

    #[must_use]
    pub fn with_source_file(mut self, source_file: Option<PathBuf>) -> Self {
        self.source_file = source_file.filter(|p| !p.as_os_str().is_empty());
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    #[must_use]
    pub fn with_skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }

    /// Explicit config path, resolved against the working directory
    #[must_use]
    pub fn explicit_config(&self) -> Option<PathBuf> {
        self.source_file.as_deref().map(|p| self.absolute(p))
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
