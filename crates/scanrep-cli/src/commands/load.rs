//! `scanrep load` command implementation

use super::{open_store, reader_for};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::progress::create_row_progress;
use crate::InputArgs;
use colored::Colorize;
use rusqlite::Connection;
use scanrep_core::{ConflictPolicy, LoadSummary, ScanFile};
use std::path::{Path, PathBuf};
use tracing::info;

/// Run the load command
pub async fn run(config: Config, csv: PathBuf, input: InputArgs, quiet: bool) -> Result<()> {
    info!(csv = %csv.display(), table = %config.table, "Running load command");

    let summary = tokio::task::spawn_blocking(move || {
        let mut conn = open_store(&config)?;
        load_into(&mut conn, &config, &csv, &input, quiet).map(|(_, summary)| summary)
    })
    .await??;

    print_summary(&summary);
    Ok(())
}

/// Read `csv` and load it into the configured table on `conn`
pub fn load_into(
    conn: &mut Connection,
    config: &Config,
    csv: &Path,
    input: &InputArgs,
    quiet: bool,
) -> Result<(ScanFile, LoadSummary)> {
    if !csv.exists() {
        return Err(CliError::file_not_found(csv));
    }

    let reader = reader_for(input)?;
    let scan = reader.read_scan_file(csv).map_err(CliError::from_core)?;

    let mut loader = config.loader(reader);
    if input.fail_if_exists {
        loader = loader.conflict_policy(ConflictPolicy::FailIfExists);
    }

    let pb = create_row_progress(scan.row_count() as u64, "Loading rows", quiet);
    let result = loader.load_scan_with(conn, &scan, |_| pb.inc(1));
    pb.finish_and_clear();

    let summary = result.map_err(CliError::from_core)?;
    Ok((scan, summary))
}

pub fn print_summary(summary: &LoadSummary) {
    let action = if summary.created { "Created" } else { "Appended to" };
    println!(
        "{} {} table '{}': {} row(s), {} column(s)",
        "✓".green(),
        action,
        summary.table.cyan(),
        summary.rows_inserted,
        summary.schema.len()
    );
}
