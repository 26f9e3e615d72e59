//! `scanrep report` command implementation

use super::open_store;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::progress::create_spinner;
use crate::sink::create_sink;
use crate::OutputArgs;
use colored::Colorize;
use rusqlite::Connection;
use scanrep_core::report::materialize_crosstab;
use scanrep_core::{ReportEngine, ReportGrid, ScanDataGrid, ScanFile};
use std::path::PathBuf;
use tracing::{info, warn};

/// Run the report command
pub async fn run(config: Config, output: OutputArgs, quiet: bool) -> Result<()> {
    info!(table = %config.table, format = ?output.format, "Running report command");

    let files = tokio::task::spawn_blocking(move || {
        let conn = open_store(&config)?;
        let stem = config.table.clone();
        render(&conn, &config, &output, None, &stem, quiet)
    })
    .await??;

    print_outputs(&files);
    Ok(())
}

/// Compute every report on `conn` and hand the grids to the selected sink.
///
/// Per-OS crosstabs follow the standard reports when requested; `scan` adds
/// the raw "Scan Data" sheet last.
pub fn render(
    conn: &Connection,
    config: &Config,
    output: &OutputArgs,
    scan: Option<&ScanFile>,
    stem: &str,
    quiet: bool,
) -> Result<Vec<PathBuf>> {
    let mut columns = config.columns.clone();
    if let Some(state) = &output.state_column {
        columns.state = Some(state.clone());
    }

    let spinner = create_spinner("Computing reports", quiet);
    let computed = ReportEngine::open(conn, &config.table, columns)
        .and_then(|engine| {
            let reports = engine.run_all()?;
            let per_os = if output.per_os {
                engine.per_os_crosstabs()?
            } else {
                Vec::new()
            };
            Ok((reports, per_os))
        })
        .map_err(CliError::from_core);
    spinner.finish_and_clear();
    let (reports, per_os) = computed?;

    if let Some(result_table) = &output.materialize {
        match &reports.crosstab {
            Some(rows) => {
                materialize_crosstab(conn, result_table, rows).map_err(CliError::from_core)?;
            },
            None => warn!(result_table = %result_table, "No crosstab computed, nothing to store"),
        }
    }

    let scan_grid = scan.map(ScanDataGrid::new);
    let mut grids = reports.grids();
    grids.extend(per_os.iter().map(|crosstab| crosstab as &dyn ReportGrid));
    if let Some(grid) = &scan_grid {
        grids.push(grid as &dyn ReportGrid);
    }

    let mut sink = create_sink(
        output.format,
        output.output.clone(),
        output.template.clone(),
        &config.output_dir,
        stem,
    )?;
    sink.write(&grids)
}

pub fn print_outputs(files: &[PathBuf]) {
    for file in files {
        println!("{} Output written to: {}", "✓".green(), file.display().to_string().cyan());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ReportFormat;
    use scanrep_core::Loader;

    fn loaded() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        let scan = ScanFile {
            header: ["Host", "CVSS", "Name", "CVE", "asset.operating_system", "Severity", "state"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: vec![["h1", "10", "Oracle DB", "CVE-2021-1", "Linux", "Critical", "NEW"]
                .iter()
                .map(|s| s.to_string())
                .collect()],
        };
        Loader::new("scan").load_scan(&mut conn, &scan).unwrap();
        conn
    }

    fn output(format: ReportFormat, path: PathBuf) -> OutputArgs {
        OutputArgs {
            format,
            output: Some(path),
            state_column: None,
            materialize: None,
            per_os: false,
            template: None,
        }
    }

    #[test]
    fn test_render_csv_directory() {
        let conn = loaded();
        let dir = tempfile::tempdir().unwrap();
        let out = output(ReportFormat::Csv, dir.path().join("reports"));

        let files = render(&conn, &Config::default(), &out, None, "scan", true).unwrap();
        assert_eq!(files.len(), 6);
        assert!(files.iter().all(|f| f.exists()));
    }

    #[test]
    fn test_render_materializes_crosstab() {
        let conn = loaded();
        let dir = tempfile::tempdir().unwrap();
        let mut out = output(ReportFormat::Json, dir.path().join("reports.json"));
        out.materialize = Some("ResultTable".to_string());

        render(&conn, &Config::default(), &out, None, "scan", true).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ResultTable", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_render_per_os_sheets() {
        let conn = loaded();
        let dir = tempfile::tempdir().unwrap();
        let mut out = output(ReportFormat::Csv, dir.path().join("reports"));
        out.per_os = true;

        let files = render(&conn, &Config::default(), &out, None, "scan", true).unwrap();
        assert_eq!(files.len(), 7);

        let linux = std::fs::read_to_string(dir.path().join("reports/os_linux.csv")).unwrap();
        assert_eq!(linux, "Operating System,Severity,State,Count\nLinux,Critical,NEW,1\n");
    }

    #[test]
    fn test_render_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = output(ReportFormat::Json, dir.path().join("reports.json"));

        let err = render(&conn, &Config::default(), &out, None, "scan", true).unwrap_err();
        assert!(matches!(err, CliError::TableMissing(_)));
    }
}
