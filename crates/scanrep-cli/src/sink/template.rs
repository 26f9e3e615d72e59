use super::ReportSink;
use crate::error::{CliError, Result};
use scanrep_core::{CellRef, CellValue, ReportGrid};
use std::path::PathBuf;
use tracing::{debug, info, instrument};
use umya_spreadsheet::Worksheet;

/// Fills an existing workbook, keeping its other sheets, charts and styles.
///
/// Each grid goes to the sheet of the same name, which is added when the
/// template lacks it. A sheet whose header row already holds labels keeps
/// them; only the data cells are written.
pub struct TemplateSink {
    template: PathBuf,
    path: PathBuf,
}

impl TemplateSink {
    pub fn new(template: PathBuf, path: PathBuf) -> Self {
        Self { template, path }
    }
}

impl ReportSink for TemplateSink {
    #[instrument(skip(self, grids), fields(template = %self.template.display(), path = %self.path.display()))]
    fn write(&mut self, grids: &[&dyn ReportGrid]) -> Result<Vec<PathBuf>> {
        let mut book = umya_spreadsheet::reader::xlsx::read(&self.template)
            .map_err(|e| CliError::template(&self.template, e))?;

        for grid in grids {
            let name = grid.sheet_name();
            if book.get_sheet_by_name_mut(name).is_none() {
                debug!(sheet = name, "Template lacks sheet, adding it");
                book.new_sheet(name)
                    .map_err(|e| CliError::template(&self.template, e))?;
            }
            let sheet = book.get_sheet_by_name_mut(name).ok_or_else(|| {
                CliError::template(&self.template, format!("sheet '{name}' is not writable"))
            })?;

            if header_row_is_empty(sheet) {
                for (cell, value) in grid.header_cells() {
                    write_cell(sheet, cell, &value);
                }
            }
            for (cell, value) in grid.cells() {
                write_cell(sheet, cell, &value);
            }
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        umya_spreadsheet::writer::xlsx::write(&book, &self.path)
            .map_err(|e| CliError::template(&self.path, e))?;

        info!(sheets = grids.len(), "Template populated");
        Ok(vec![self.path.clone()])
    }
}

fn header_row_is_empty(sheet: &Worksheet) -> bool {
    sheet
        .get_cell((1u32, 1u32))
        .map_or(true, |cell| cell.get_value().trim().is_empty())
}

/// umya addresses cells as (column, row), both 1-based like [`CellRef`]
fn write_cell(sheet: &mut Worksheet, cell: CellRef, value: &CellValue) {
    let target = sheet.get_cell_mut((cell.col, cell.row));
    match value {
        CellValue::Integer(v) => target.set_value_number(*v as f64),
        CellValue::Number(v) => target.set_value_number(*v),
        CellValue::Text(v) => target.set_value_string(v.clone()),
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Data, Reader};
    use rust_xlsxwriter::Workbook;
    use scanrep_core::report::{SeverityCounts, YearCount};
    use std::path::Path;

    /// Workbook with a labelled severity sheet and an unrelated chart sheet
    fn write_template(path: &Path) {
        let mut workbook = Workbook::new();

        let severity = workbook.add_worksheet();
        severity.set_name("CVSS By Severity").unwrap();
        for (col, label) in ["Crit", "Sev", "Hi", "Med", "Lo"].iter().enumerate() {
            severity.write_string(0, col as u16, *label).unwrap();
        }

        let charts = workbook.add_worksheet();
        charts.set_name("Charts").unwrap();
        charts.write_string(0, 0, "Severity overview").unwrap();
        charts.write_number(1, 0, 42.0).unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn test_fills_template_and_keeps_other_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("Chart_Template.xlsx");
        let output = dir.path().join("Populated_Chart_Template.xlsx");
        write_template(&template);

        let severity = SeverityCounts {
            critical: 3,
            severe: 0,
            high: 1,
            medium: 0,
            low: 2,
        };
        let years = vec![YearCount {
            year: "2021".to_string(),
            count: 2,
        }];

        let files = TemplateSink::new(template.clone(), output.clone())
            .write(&[&severity, &years])
            .unwrap();
        assert_eq!(files, vec![output.clone()]);

        let mut workbook = open_workbook_auto(&output).unwrap();
        assert_eq!(
            workbook.sheet_names().to_owned(),
            vec!["CVSS By Severity", "Charts", "Vulnerabilities By Year"]
        );

        let charts = workbook.worksheet_range("Charts").unwrap();
        assert_eq!(charts.get_value((0, 0)), Some(&Data::String("Severity overview".to_string())));
        assert_eq!(charts.get_value((1, 0)), Some(&Data::Float(42.0)));

        let sheet = workbook.worksheet_range("CVSS By Severity").unwrap();
        assert_eq!(sheet.get_value((0, 0)), Some(&Data::String("Crit".to_string())));
        assert_eq!(sheet.get_value((1, 0)), Some(&Data::Float(3.0)));
        assert_eq!(sheet.get_value((1, 4)), Some(&Data::Float(2.0)));

        let sheet = workbook.worksheet_range("Vulnerabilities By Year").unwrap();
        assert_eq!(sheet.get_value((0, 0)), Some(&Data::String("Year".to_string())));
        assert_eq!(sheet.get_value((1, 0)), Some(&Data::Float(2021.0)));

        // The template itself is left as it was
        let mut original = open_workbook_auto(&template).unwrap();
        assert_eq!(original.sheet_names().len(), 2);
        let sheet = original.worksheet_range("CVSS By Severity").unwrap();
        assert_eq!(sheet.get_value((1, 0)), None);
    }

    #[test]
    fn test_invalid_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("broken.xlsx");
        std::fs::write(&template, b"not a workbook").unwrap();

        let err = TemplateSink::new(template, dir.path().join("out.xlsx"))
            .write(&[])
            .unwrap_err();
        assert!(matches!(err, CliError::Template { .. }));
    }
}
