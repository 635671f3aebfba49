use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification of a [`CelloError`], used by callers that sweep many
/// configurations and need to decide whether a failure is worth aborting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Environment,
    Execution,
    ResultNotFound,
    Parse,
    Busy,
    Io,
}

#[derive(Debug, Error)]
pub enum CelloError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration error: {role} file '{}' does not exist", .path.display())]
    MissingInputFile { role: &'static str, path: PathBuf },

    #[error("Configuration error: cannot select signal '{signal}', available signals are {available:?}")]
    UnknownSignal {
        signal: String,
        available: Vec<String>,
    },

    #[error("Container environment unavailable: {0}")]
    Environment(String),

    #[error("Cello exited with {}:\n{output}", describe_exit(.exit_code))]
    Execution {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Cello did not finish within its {} limit and was killed:\n{output}", describe_limit(.limit))]
    TimedOut { limit: Duration, output: String },

    #[error("No {artifact} found in '{}'; the run produced no valid circuit or failed before writing output", .dir.display())]
    ResultNotFound {
        artifact: &'static str,
        dir: PathBuf,
    },

    #[error("Found {} candidates for the {artifact} in the output directory: {matches:?}", .matches.len())]
    AmbiguousResult {
        artifact: &'static str,
        matches: Vec<PathBuf>,
    },

    #[error("Failed to parse '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Output directory '{}' is in use by another invocation (lock file '{}')", .dir.display(), .lock.display())]
    OutputBusy { dir: PathBuf, lock: PathBuf },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by a signal)".to_string(),
    }
}

fn describe_limit(limit: &Duration) -> String {
    if limit.subsec_nanos() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{:.3}s", limit.as_secs_f64())
    }
}

impl CelloError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::MissingInputFile { .. } | Self::UnknownSignal { .. } => {
                ErrorCategory::Configuration
            }
            Self::Environment(_) => ErrorCategory::Environment,
            Self::Execution { .. } | Self::TimedOut { .. } => ErrorCategory::Execution,
            Self::ResultNotFound { .. } => ErrorCategory::ResultNotFound,
            Self::AmbiguousResult { .. } | Self::Parse { .. } => ErrorCategory::Parse,
            Self::OutputBusy { .. } => ErrorCategory::Busy,
            Self::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Whether this failure only means that one particular configuration did not
    /// yield a usable circuit. Sweeps skip these and move on.
    pub fn is_no_viable_circuit(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Execution | ErrorCategory::ResultNotFound | ErrorCategory::Parse
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into().to_string_lossy().to_string(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
