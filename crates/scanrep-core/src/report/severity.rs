use super::{band_sums, ReportEngine};
use crate::error::{Error, Result};
use rusqlite::params_from_iter;
use scanrep_common::CvssBand;
use serde::Serialize;
use tracing::{debug, instrument};

const REPORT: &str = "severity_counts";

/// Row counts per CVSS band. Scores outside every band (empty, non-numeric,
/// negative, above 10) are not counted anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: i64,
    pub severe: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl SeverityCounts {
    pub fn get(&self, band: CvssBand) -> i64 {
        match band {
            CvssBand::Critical => self.critical,
            CvssBand::Severe => self.severe,
            CvssBand::High => self.high,
            CvssBand::Medium => self.medium,
            CvssBand::Low => self.low,
        }
    }

    pub fn total(&self) -> i64 {
        CvssBand::ALL.iter().map(|band| self.get(*band)).sum()
    }
}

impl ReportEngine<'_> {
    #[instrument(skip(self))]
    pub fn severity_counts(&self) -> Result<SeverityCounts> {
        let cvss = self.cvss_column()?;
        let (sums, params) = band_sums(&cvss);
        let sql = format!("SELECT {} FROM {}", sums.join(", "), self.table()?);

        let counts = self
            .conn
            .query_row(&sql, params_from_iter(params), |row| {
                Ok(SeverityCounts {
                    critical: row.get(0)?,
                    severe: row.get(1)?,
                    high: row.get(2)?,
                    medium: row.get(3)?,
                    low: row.get(4)?,
                })
            })
            .map_err(Error::query(REPORT))?;

        debug!(total = counts.total(), "Counted severity bands");
        Ok(counts)
    }
}
