//! `scanrep fill-nulls` command implementation

use super::open_store;
use crate::config::Config;
use crate::error::{CliError, Result};
use colored::Colorize;
use tracing::info;

/// Run the fill-nulls command
pub async fn run(config: Config) -> Result<()> {
    info!(table = %config.table, "Running fill-nulls command");

    let table = config.table.clone();
    let changed = tokio::task::spawn_blocking(move || {
        let conn = open_store(&config)?;
        scanrep_core::fill_nulls(&conn, &config.table).map_err(CliError::from_core)
    })
    .await??;

    println!(
        "{} Normalized NULLs in table '{}' ({} row(s) updated)",
        "✓".green(),
        table.cyan(),
        changed
    );
    Ok(())
}
