//! scanrep CLI Library
//!
//! Command-line interface for loading vulnerability-scan exports into SQLite
//! and rendering the standard report set.
//!
//! # Overview
//!
//! - **Loading**: import a scanner CSV into a table (`scanrep load`)
//! - **Reporting**: compute every report and write it out (`scanrep report`)
//! - **One-shot**: load and report in a single step (`scanrep run`)
//! - **Inspection**: show a table's columns (`scanrep schema`)
//! - **Maintenance**: normalize NULLs left by other tools (`scanrep fill-nulls`)

pub mod commands;
pub mod config;
pub mod error;
pub mod progress;
pub mod sink;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, Result};

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// scanrep - Vulnerability scan reporting
#[derive(Parser, Debug)]
#[command(name = "scanrep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// SQLite database file (":memory:" for a throwaway database)
    #[arg(long, env = "SCANREP_DB", global = true)]
    pub db: Option<String>,

    /// Table holding the scan rows
    #[arg(short, long, env = "SCANREP_TABLE", global = true)]
    pub table: Option<String>,

    /// Configuration file (defaults to ./scanrep.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the full command reference as Markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a scanner CSV export into the database
    Load {
        /// CSV file to import
        csv: PathBuf,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Compute every report from an already-loaded table
    Report {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Load a CSV export and report on it in one go
    Run {
        /// CSV file to import
        csv: PathBuf,

        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the columns of the scan table
    Schema,

    /// Replace NULL values with empty strings in every column
    FillNulls,
}

/// Options controlling how a CSV file is read and stored
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Refuse to load when the table already exists
    #[arg(long)]
    pub fail_if_exists: bool,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    pub delimiter: char,

    /// The file has no header row; columns become column_1..column_N
    #[arg(long)]
    pub no_header: bool,
}

impl Default for InputArgs {
    fn default() -> Self {
        Self {
            fail_if_exists: false,
            delimiter: ',',
            no_header: false,
        }
    }
}

/// Options controlling where and how reports are written
#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Xlsx)]
    pub format: ReportFormat,

    /// Output path: workbook file, CSV directory, or JSON/table file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Column holding the finding state (defaults to the table's last column)
    #[arg(long)]
    pub state_column: Option<String>,

    /// Also store the OS/state crosstab in this table
    #[arg(long)]
    pub materialize: Option<String>,

    /// Add one crosstab sheet per operating system
    #[arg(long)]
    pub per_os: bool,

    /// Fill an existing workbook (e.g. one holding charts) instead of
    /// creating a new one; saved as Populated_<template> beside it
    #[arg(long, value_name = "XLSX")]
    pub template: Option<PathBuf>,
}

/// Report output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Excel workbook, one sheet per report
    Xlsx,
    /// One CSV file per report
    Csv,
    /// Single JSON document
    Json,
    /// Terminal tables
    Table,
}
