use super::ReportSink;
use crate::error::{CliError, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use scanrep_core::{CellRef, CellValue, ReportGrid};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Excel workbook with one worksheet per grid
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ReportSink for XlsxSink {
    #[instrument(skip(self, grids), fields(path = %self.path.display(), sheets = grids.len()))]
    fn write(&mut self, grids: &[&dyn ReportGrid]) -> Result<Vec<PathBuf>> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        for grid in grids {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(grid.sheet_name())?;

            for (cell, value) in grid.header_cells() {
                write_cell(worksheet, cell, &value, Some(&header_format))?;
            }
            for (cell, value) in grid.cells() {
                write_cell(worksheet, cell, &value, None)?;
            }
            worksheet.autofit();
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        workbook.save(&self.path)?;

        info!("Workbook written");
        Ok(vec![self.path.clone()])
    }
}

/// Write one 1-based cell into the 0-based worksheet grid
fn write_cell(
    worksheet: &mut Worksheet,
    cell: CellRef,
    value: &CellValue,
    format: Option<&Format>,
) -> Result<()> {
    let row = cell.row.saturating_sub(1);
    let col = u16::try_from(cell.col.saturating_sub(1))
        .map_err(|_| CliError::config(format!("cell {} is beyond the worksheet column limit", cell)))?;

    match (value, format) {
        (CellValue::Integer(v), None) => worksheet.write_number(row, col, *v as f64)?,
        (CellValue::Integer(v), Some(f)) => worksheet.write_number_with_format(row, col, *v as f64, f)?,
        (CellValue::Number(v), None) => worksheet.write_number(row, col, *v)?,
        (CellValue::Number(v), Some(f)) => worksheet.write_number_with_format(row, col, *v, f)?,
        (CellValue::Text(v), None) => worksheet.write_string(row, col, v)?,
        (CellValue::Text(v), Some(f)) => worksheet.write_string_with_format(row, col, v, f)?,
    };
    Ok(())
}
