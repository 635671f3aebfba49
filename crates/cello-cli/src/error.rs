use celloapi::{CelloError, ErrorCategory};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Cello(#[from] CelloError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit status, so scripts can tell a bad setup from a failed design.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Cello(e) => match e.category() {
                ErrorCategory::Configuration => 2,
                ErrorCategory::Environment => 3,
                ErrorCategory::Execution => 4,
                ErrorCategory::ResultNotFound | ErrorCategory::Parse => 5,
                ErrorCategory::Busy => 6,
                ErrorCategory::Io => 1,
            },
            CliError::Config(_) | CliError::FileParsing { .. } | CliError::Argument(_) => 2,
            CliError::Io(_) | CliError::Other(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_setup_from_design_failures() {
        let busy = CliError::from(CelloError::OutputBusy {
            dir: PathBuf::from("/out"),
            lock: PathBuf::from("/out/.cello-output.lock"),
        });
        assert_eq!(busy.exit_code(), 6);

        let failed = CliError::from(CelloError::Execution {
            exit_code: Some(1),
            output: String::new(),
        });
        assert_eq!(failed.exit_code(), 4);

        let unknown = CliError::from(CelloError::UnknownSignal {
            signal: "GFP".into(),
            available: vec!["LacI".into()],
        });
        assert_eq!(unknown.exit_code(), CliError::Argument(String::new()).exit_code());
        assert_eq!(CliError::Config("x".into()).exit_code(), 2);
        assert_eq!(CliError::Other(anyhow::anyhow!("boom")).exit_code(), 1);
    }
}
