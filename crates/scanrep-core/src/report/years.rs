use super::ReportEngine;
use crate::error::{Error, Result};
use rusqlite::params;
use serde::Serialize;
use tracing::{debug, instrument};

const REPORT: &str = "year_counts";

/// 1-based offset and length of the year inside `CVE-YYYY-NNNN`
const YEAR_START: i64 = 5;
const YEAR_LEN: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: String,
    pub count: i64,
}

impl ReportEngine<'_> {
    /// Rows per CVE publication year, newest first. Rows without a CVE
    /// identifier are excluded.
    #[instrument(skip(self))]
    pub fn year_counts(&self) -> Result<Vec<YearCount>> {
        let cve = self.column(&self.columns.cve)?;
        let sql = format!(
            "SELECT SUBSTR({cve}, ?1, ?2) AS cve_year, COUNT(*) \
             FROM {table} \
             WHERE {cve} IS NOT NULL AND SUBSTR({cve}, ?1, ?2) <> '' \
             GROUP BY cve_year \
             ORDER BY cve_year DESC",
            table = self.table()?,
        );

        let mut stmt = self.conn.prepare(&sql).map_err(Error::query(REPORT))?;
        let years = stmt
            .query_map(params![YEAR_START, YEAR_LEN], |row| {
                Ok(YearCount {
                    year: row.get(0)?,
                    count: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(Error::query(REPORT))?;

        debug!(years = years.len(), "Counted CVE years");
        Ok(years)
    }
}
