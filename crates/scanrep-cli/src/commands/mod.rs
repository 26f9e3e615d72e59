//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function. Database work
//! happens on the blocking pool.

pub mod fill_nulls;
pub mod load;
pub mod report;
pub mod run;
pub mod schema;

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::InputArgs;
use rusqlite::Connection;
use scanrep_core::{store, TabularReader};

/// Open the configured database
pub fn open_store(config: &Config) -> Result<Connection> {
    store::open(&config.database).map_err(CliError::from_core)
}

/// Reader settings from command-line input options
pub fn reader_for(input: &InputArgs) -> Result<TabularReader> {
    let delimiter = u8::try_from(input.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            CliError::config(format!(
                "delimiter '{}' must be a single ASCII character",
                input.delimiter
            ))
        })?;

    Ok(TabularReader::new()
        .delimiter(delimiter)
        .has_header(!input.no_header))
}
