//! Configuration management for the scanrep CLI
//!
//! Settings are layered: built-in defaults, then `scanrep.toml` (or the file
//! given with `--config`), then `SCANREP_*` environment variables, then
//! command-line flags.

use crate::error::{CliError, Result};
use scanrep_core::schema::DEFAULT_NUMERIC_COLUMN;
use scanrep_core::{ConflictPolicy, Loader, ReportColumns, TabularReader};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Database file used when none is configured
pub const DEFAULT_DATABASE: &str = "vulns.db";

/// Table used when none is configured
pub const DEFAULT_TABLE: &str = "scan";

/// Configuration file picked up from the working directory
pub const CONFIG_FILE: &str = "scanrep.toml";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database location
    pub database: String,

    /// Table holding the scan rows
    pub table: String,

    /// Column stored with NUMERIC affinity
    pub numeric_column: String,

    /// Behaviour when loading into an existing table
    pub conflict_policy: ConflictPolicy,

    /// Scanner column names the reports read
    pub columns: ReportColumns,

    /// Directory receiving report files
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            numeric_column: DEFAULT_NUMERIC_COLUMN.to_string(),
            conflict_policy: ConflictPolicy::default(),
            columns: ReportColumns::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Defaults overlaid with the config file and the environment.
    ///
    /// An explicitly named file must exist; the implicit `scanrep.toml` is
    /// optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) if !path.exists() => return Err(CliError::file_not_found(path)),
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };

        config.merge_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Reading configuration file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `SCANREP_DB`, `SCANREP_TABLE` and `SCANREP_OUTPUT_DIR`
    pub fn merge_env(&mut self) {
        if let Ok(database) = std::env::var("SCANREP_DB") {
            self.database = database;
        }

        if let Ok(table) = std::env::var("SCANREP_TABLE") {
            self.table = table;
        }

        if let Ok(dir) = std::env::var("SCANREP_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
    }

    pub fn set_database(&mut self, database: String) {
        self.database = database;
    }

    pub fn set_table(&mut self, table: String) {
        self.table = table;
    }

    pub fn set_state_column(&mut self, column: String) {
        self.columns.state = Some(column);
    }

    /// Loader configured from these settings
    pub fn loader(&self, reader: TabularReader) -> Loader {
        Loader::new(self.table.clone())
            .conflict_policy(self.conflict_policy)
            .numeric_column(self.numeric_column.clone())
            .reader(reader)
    }
}
