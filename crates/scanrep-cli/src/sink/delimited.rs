use super::{sheet_slug, ReportSink};
use crate::error::Result;
use scanrep_core::ReportGrid;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// One CSV file per grid inside a directory
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl ReportSink for CsvSink {
    #[instrument(skip(self, grids), fields(dir = %self.dir.display()))]
    fn write(&mut self, grids: &[&dyn ReportGrid]) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir)?;

        let mut files = Vec::with_capacity(grids.len());
        for grid in grids {
            let path = self.dir.join(format!("{}.csv", sheet_slug(grid.sheet_name())));
            let mut writer = csv::Writer::from_path(&path)?;

            writer.write_record(grid.headers())?;
            for row in grid.rows() {
                writer.write_record(row.iter().map(|value| value.to_string()))?;
            }
            writer.flush()?;

            debug!(path = %path.display(), "Wrote report CSV");
            files.push(path);
        }
        Ok(files)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use scanrep_core::report::VulnerabilityCount;

    #[test]
    fn test_one_file_per_grid() {
        let dir = tempfile::tempdir().unwrap();
        let vulns = vec![VulnerabilityCount {
            name: "Apache, httpd".to_string(),
            max_cvss: 9.8,
            count: 3,
        }];

        let files = CsvSink::new(dir.path().to_path_buf())
            .write(&[&vulns])
            .unwrap();
        assert_eq!(files, vec![dir.path().join("most_common_vulnerabilities.csv")]);

        let contents = std::fs::read_to_string(&files[0]).unwrap();
        assert_eq!(contents, "Vulnerability,CVSS,Count\n\"Apache, httpd\",9.8,3\n");
    }
}
