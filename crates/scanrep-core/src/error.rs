//! Error types for loading and reporting

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is terminal for the current run; nothing here is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Source file could not be opened or read
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited text (bad quoting, invalid UTF-8)
    #[error("Malformed CSV at {position}: {message}")]
    Parse { position: String, message: String },

    /// Header cannot be turned into a table definition, or a report
    /// references a column the table does not have
    #[error("Schema error: {0}")]
    Schema(String),

    /// Data row width differs from the header width
    #[error("Data row {row} has {found} fields, expected {expected}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Table already present and the conflict policy forbids reuse
    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// Insert failed for a specific data row; the batch was rolled back
    #[error("Failed to insert data row {row}: {source}")]
    Insert {
        row: usize,
        #[source]
        source: rusqlite::Error,
    },

    /// A report query failed to prepare, execute or scan
    #[error("Report '{report}' failed: {source}")]
    Query {
        report: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Connection, transaction or DDL failure
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl Error {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Helper for `map_err` on report queries
    pub(crate) fn query(report: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Query { report, source }
    }
}
