//! Error types for the scanrep CLI
//!
//! Messages are user-facing and say what to check or run next.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Loading or reporting failed in the core library
    #[error(transparent)]
    Core(#[from] scanrep_core::Error),

    /// Required file is missing
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check scanrep.toml, SCANREP_* variables and command-line flags.")]
    Config(String),

    /// Scan table has not been loaded yet
    #[error("Table '{0}' does not exist. Run 'scanrep load <csv>' first.")]
    TableMissing(String),

    /// Report store access failed outside the core library
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// Writing delimited output failed
    #[error("Failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),

    /// Writing the workbook failed
    #[error("Failed to write workbook: {0}. Close the file if it is open in a spreadsheet application.")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Reading or saving a workbook template failed
    #[error("Failed to fill workbook template '{path}': {message}. Check that it is a valid .xlsx file.")]
    Template { path: String, message: String },

    /// JSON serialization failed
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("Failed to parse configuration file: {0}. Check the file syntax at the indicated line.")]
    TomlParse(#[from] toml::de::Error),

    /// Background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a file-not-found error
    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::FileNotFound(path.as_ref().display().to_string())
    }

    /// Create a template error for `path`
    pub fn template(path: impl AsRef<std::path::Path>, err: impl std::fmt::Display) -> Self {
        Self::Template {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Wrap a core error, turning a missing table into a hint to load first
    pub fn from_core(err: scanrep_core::Error) -> Self {
        match err {
            scanrep_core::Error::TableNotFound(table) => Self::TableMissing(table),
            other => Self::Core(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_table_is_actionable() {
        let err = CliError::from_core(scanrep_core::Error::TableNotFound("scan".into()));
        assert!(err.to_string().contains("scanrep load"));
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err = CliError::from_core(scanrep_core::Error::TableExists("scan".into()));
        assert_eq!(err.to_string(), "Table 'scan' already exists");
    }

    #[test]
    fn test_file_not_found_message() {
        let err = CliError::file_not_found("/tmp/missing.csv");
        assert!(err.to_string().contains("/tmp/missing.csv"));
    }
}
