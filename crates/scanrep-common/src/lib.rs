//! scanrep Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared vocabulary, error types and logging setup for the scanrep workspace.
//!
//! # Overview
//!
//! - **Types**: canonical severities, scan states and CVSS bands
//! - **Error Handling**: errors raised while parsing that vocabulary
//! - **Logging**: `tracing` subscriber configuration shared by every binary
//!
//! # Example
//!
//! ```
//! use scanrep_common::types::{CvssBand, Severity};
//!
//! assert_eq!(CvssBand::classify(9.5), Some(CvssBand::Severe));
//! assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{CvssBand, ScanState, Severity};
