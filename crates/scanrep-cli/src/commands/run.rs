//! `scanrep run` command implementation
//!
//! Load a CSV export and report on it over a single connection, so
//! `--db :memory:` works end to end.

use super::load::{load_into, print_summary};
use super::open_store;
use super::report::{print_outputs, render};
use crate::config::Config;
use crate::error::Result;
use crate::{InputArgs, OutputArgs};
use std::path::{Path, PathBuf};
use tracing::info;

/// Run the load-then-report command
pub async fn run(
    config: Config,
    csv: PathBuf,
    input: InputArgs,
    output: OutputArgs,
    quiet: bool,
) -> Result<()> {
    info!(csv = %csv.display(), table = %config.table, "Running run command");

    let (summary, files) = tokio::task::spawn_blocking(move || {
        let mut conn = open_store(&config)?;
        let (scan, summary) = load_into(&mut conn, &config, &csv, &input, quiet)?;
        let files = render(&conn, &config, &output, Some(&scan), &report_stem(&csv), quiet)?;
        Ok::<_, crate::CliError>((summary, files))
    })
    .await??;

    print_summary(&summary);
    print_outputs(&files);
    Ok(())
}

/// Name reports after the input file
fn report_stem(csv: &Path) -> String {
    csv.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_string())
}
