//! Error types for the duckpad engine.
//!
//! Covers the whole taxonomy surfaced by the workbench: readiness,
//! input validation, unsupported file types, statement failures and
//! exhausted extension provisioning.

/// Errors from the workbench and the engine seam beneath it.
#[derive(Debug, thiserror::Error)]
pub enum WorkbenchError {
    /// No engine has been bootstrapped into the workbench yet.
    #[error("Engine is not ready: wait for initialization to finish and try again")]
    EngineNotReady,

    /// User input failed validation before reaching the engine
    /// (empty table name, empty extension name, missing source, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The source file extension does not map to a known reader.
    #[error("Unsupported file type: '{0}' (expected csv, parquet or json)")]
    UnsupportedFileType(String),

    /// The engine rejected a statement.
    ///
    /// The inner string carries the engine diagnostic message.
    #[error("Query failed: {0}")]
    QueryExecution(String),

    /// All provisioning tiers were exhausted for an extension.
    #[error("Failed to install/load extension '{name}': {last_error}")]
    ProvisioningFailed {
        /// Extension that could not be loaded.
        name: String,
        /// Error reported by the last tier attempted.
        last_error: String,
    },

    /// The network filesystem extension could not be loaded, so remote
    /// reads are expected to fail.
    #[error("Network extension unavailable: {0}")]
    NetworkExtensionUnavailable(String),

    /// Engine or workbench configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure while staging buffers.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkbenchError {
    /// Create an `InvalidInput` error.
    ///
    /// # Examples
    ///
    /// ```
    /// use duckpad_engine::error::WorkbenchError;
    ///
    /// let err = WorkbenchError::invalid_input("Please enter a valid table name.");
    /// assert!(err.to_string().contains("valid table name"));
    /// ```
    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::InvalidInput(detail.into())
    }

    /// Create a `QueryExecution` error that previews the failing statement.
    pub fn query_failed(sql: &str, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        // Truncate very long statements in the error message
        let sql_preview = if sql.chars().count() > 120 {
            format!("{}...", sql.chars().take(120).collect::<String>())
        } else {
            sql.to_string()
        };
        Self::QueryExecution(format!("{} (statement: {})", detail, sql_preview))
    }
}

impl From<duckdb::Error> for WorkbenchError {
    fn from(e: duckdb::Error) -> Self {
        WorkbenchError::QueryExecution(e.to_string())
    }
}

/// A specialised `Result` type for workbench operations.
pub type Result<T> = std::result::Result<T, WorkbenchError>;
