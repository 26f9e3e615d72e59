use super::{band_sums, ReportEngine, TOP_N};
use crate::error::{Error, Result};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Serialize;
use tracing::{debug, instrument};

const REPORT: &str = "host_ranking";

/// Summed CVSS score of one host with its per-band row counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostScore {
    pub host: String,
    /// Sum of all scores on the host, rounded to the nearest integer
    pub cvss_total: i64,
    pub critical: i64,
    pub severe: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl ReportEngine<'_> {
    /// Top hosts by summed score, ties broken by host name
    #[instrument(skip(self))]
    pub fn host_ranking(&self) -> Result<Vec<HostScore>> {
        let host = self.column(&self.columns.host)?;
        let cvss = self.cvss_column()?;
        let (sums, mut params) = band_sums(&cvss);
        params.push(Value::Integer(TOP_N));

        let sql = format!(
            "SELECT {host}, CAST(ROUND(COALESCE(SUM({cvss}), 0)) AS INTEGER) AS cvss_total, {sums} \
             FROM {table} \
             GROUP BY {host} \
             ORDER BY cvss_total DESC, {host} ASC \
             LIMIT ?",
            sums = sums.join(", "),
            table = self.table()?,
        );

        let mut stmt = self.conn.prepare(&sql).map_err(Error::query(REPORT))?;
        let hosts = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(HostScore {
                    host: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    cvss_total: row.get(1)?,
                    critical: row.get(2)?,
                    severe: row.get(3)?,
                    high: row.get(4)?,
                    medium: row.get(5)?,
                    low: row.get(6)?,
                })
            })
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(Error::query(REPORT))?;

        debug!(hosts = hosts.len(), "Ranked hosts");
        Ok(hosts)
    }
}
