//! Error types for scanrep vocabulary parsing

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("Unknown severity: {0}. Expected one of Critical, High, Medium, Low")]
    UnknownSeverity(String),

    #[error("Unknown scan state: {0}. Expected one of ACTIVE, RESURFACED, FIXED, NEW")]
    UnknownState(String),
}
