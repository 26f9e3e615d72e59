//! scanrep Core Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads vulnerability-scan exports into SQLite and computes the fixed set of
//! aggregate reports over them.
//!
//! # Overview
//!
//! - **Reader**: delimited text into header and raw rows
//! - **Schema**: header sanitizing and the ordered column list every other
//!   stage works from
//! - **Loader**: table creation and all-or-nothing bulk insert
//! - **Reports**: severity histogram, top hosts, top vulnerabilities, type
//!   breakdown, CVE years and the OS/state crosstab
//! - **Grid**: a sheet layout of every report for spreadsheet-like sinks
//!
//! # Example
//!
//! ```no_run
//! use scanrep_core::{store, Loader, ReportColumns, ReportEngine};
//! use std::path::Path;
//!
//! fn main() -> scanrep_core::Result<()> {
//!     let mut conn = store::open("vulns.db")?;
//!     Loader::new("scan").load_file(&mut conn, Path::new("export.csv"))?;
//!
//!     let engine = ReportEngine::open(&conn, "scan", ReportColumns::default())?;
//!     let reports = engine.run_all()?;
//!     println!("{} critical findings", reports.severity.critical);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod grid;
pub mod ident;
pub mod loader;
pub mod reader;
pub mod report;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use grid::{CellRef, CellValue, ReportGrid, ScanDataGrid};
pub use loader::{fill_nulls, ConflictPolicy, LoadSummary, Loader};
pub use reader::{ScanFile, TabularReader};
pub use report::{ReportColumns, ReportEngine, ReportSet};
pub use schema::{ColumnDefinition, ColumnType, SchemaBuilder, TableSchema};
