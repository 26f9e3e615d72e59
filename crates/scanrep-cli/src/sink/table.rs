use super::ReportSink;
use crate::error::Result;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use scanrep_core::ReportGrid;
use std::io::Write;
use std::path::PathBuf;

/// Terminal tables, one per grid
pub struct TableSink<W: Write> {
    writer: W,
    path: Option<PathBuf>,
}

impl<W: Write> TableSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, path: None }
    }

    pub fn to_file(writer: W, path: PathBuf) -> Self {
        Self {
            writer,
            path: Some(path),
        }
    }
}

/// Render one grid as a table
pub fn format_grid(grid: &dyn ReportGrid) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(grid.headers());

    for row in grid.rows() {
        table.add_row(row.iter().map(|value| value.to_string()).collect::<Vec<_>>());
    }

    format!("{}\n", table)
}

impl<W: Write> ReportSink for TableSink<W> {
    fn write(&mut self, grids: &[&dyn ReportGrid]) -> Result<Vec<PathBuf>> {
        for grid in grids {
            writeln!(self.writer, "{}", grid.sheet_name().cyan().bold())?;
            if grid.rows().is_empty() {
                writeln!(self.writer, "  (no rows)\n")?;
                continue;
            }
            writeln!(self.writer, "{}", format_grid(*grid))?;
        }
        self.writer.flush()?;

        Ok(self.path.iter().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use scanrep_core::report::{SeverityCounts, YearCount};

    #[test]
    fn test_format_grid_contains_values() {
        let counts = SeverityCounts {
            critical: 4,
            ..Default::default()
        };
        let rendered = format_grid(&counts);

        assert!(rendered.contains("Critical"));
        assert!(rendered.contains('4'));
    }

    #[test]
    fn test_empty_grid_is_noted() {
        let years: Vec<YearCount> = Vec::new();
        let mut buffer = Vec::new();
        TableSink::new(&mut buffer).write(&[&years]).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("Vulnerabilities By Year"));
        assert!(output.contains("(no rows)"));
    }
}
