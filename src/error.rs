//! Error types for duckpad
//!
//! The engine crate reports [`WorkbenchError`]; everything the command-line
//! surface adds on top (configuration files, terminal IO, line editing)
//! is collected here.

use duckpad_engine::WorkbenchError;
use thiserror::Error;

/// Result type alias for duckpad operations
pub type Result<T> = std::result::Result<T, DuckpadError>;

/// Errors surfaced by the duckpad binary.
#[derive(Error, Debug)]
pub enum DuckpadError {
    /// Failure inside the workbench (ingestion, queries, extensions)
    #[error(transparent)]
    Workbench(#[from] WorkbenchError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal or filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line editor failure in the interactive shell
    #[error("Shell error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl DuckpadError {
    /// One-line hint printed under the error, if there is a useful one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            DuckpadError::Workbench(WorkbenchError::NetworkExtensionUnavailable(_)) => {
                Some("Remote reads need the httpfs extension; check network access to the extension repositories")
            }
            DuckpadError::Workbench(WorkbenchError::ProvisioningFailed { .. }) => {
                Some("Check the extension name, or point --core-repository/--community-repository at a reachable mirror")
            }
            DuckpadError::Workbench(WorkbenchError::UnsupportedFileType(_)) => {
                Some("Supported file types are .csv, .parquet and .json")
            }
            DuckpadError::Config(_) => Some("Run 'duckpad --generate-config' for a commented example"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workbench_errors_are_transparent() {
        let err: DuckpadError = WorkbenchError::EngineNotReady.into();
        assert_eq!(err.to_string(), WorkbenchError::EngineNotReady.to_string());
    }

    #[test]
    fn test_hints() {
        let err: DuckpadError = WorkbenchError::UnsupportedFileType("txt".into()).into();
        assert!(err.hint().unwrap().contains(".parquet"));
        assert!(DuckpadError::Config("bad".into()).hint().is_some());
        let io: DuckpadError = std::io::Error::other("boom").into();
        assert!(io.hint().is_none());
    }
}
