//! Report sinks
//!
//! A sink receives every report as a [`ReportGrid`] and renders it in one
//! output format. Sinks never see the aggregation logic.

mod delimited;
mod json;
mod table;
mod template;
mod xlsx;

pub use self::delimited::CsvSink;
pub use self::json::{grid_to_json, JsonSink};
pub use self::table::{format_grid, TableSink};
pub use self::template::TemplateSink;
pub use self::xlsx::XlsxSink;

use crate::error::{CliError, Result};
use crate::ReportFormat;
use scanrep_core::ReportGrid;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Destination for a full set of report grids
pub trait ReportSink {
    /// Write every grid. Returns the files produced; empty when the output
    /// went to a stream.
    fn write(&mut self, grids: &[&dyn ReportGrid]) -> Result<Vec<PathBuf>>;
}

/// Workbook file name for a report set named `stem`
pub fn workbook_name(stem: &str) -> String {
    format!("Populated_{stem}.xlsx")
}

/// `Populated_<file name>` in the template's directory
pub fn populated_path(template: &Path) -> PathBuf {
    let name = template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| workbook_name("template"));
    template.with_file_name(format!("Populated_{name}"))
}

/// File-system friendly name for a sheet: `CVSS By Severity` → `cvss_by_severity`
pub fn sheet_slug(sheet: &str) -> String {
    sheet
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Build the sink for `format`.
///
/// Without an explicit `output`, workbooks and CSV directories are placed
/// in `output_dir` under names derived from `stem`; JSON and tables go to
/// stdout. A `template` switches xlsx output to filling that workbook, saved
/// beside it as `Populated_<template>` unless `output` says otherwise.
pub fn create_sink(
    format: ReportFormat,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
    output_dir: &Path,
    stem: &str,
) -> Result<Box<dyn ReportSink>> {
    if let Some(template) = template {
        if format != ReportFormat::Xlsx {
            return Err(CliError::config("--template only applies to xlsx output"));
        }
        if !template.exists() {
            return Err(CliError::file_not_found(&template));
        }
        let path = output.unwrap_or_else(|| populated_path(&template));
        return Ok(Box::new(TemplateSink::new(template, path)));
    }

    let sink: Box<dyn ReportSink> = match format {
        ReportFormat::Xlsx => Box::new(XlsxSink::new(
            output.unwrap_or_else(|| output_dir.join(workbook_name(stem))),
        )),
        ReportFormat::Csv => Box::new(CsvSink::new(
            output.unwrap_or_else(|| output_dir.join(format!("{stem}_reports"))),
        )),
        ReportFormat::Json => match output {
            Some(path) => Box::new(JsonSink::to_file(BufWriter::new(File::create(&path)?), path)),
            None => Box::new(JsonSink::new(std::io::stdout())),
        },
        ReportFormat::Table => match output {
            Some(path) => Box::new(TableSink::to_file(BufWriter::new(File::create(&path)?), path)),
            None => Box::new(TableSink::new(std::io::stdout())),
        },
    };
    Ok(sink)
}
