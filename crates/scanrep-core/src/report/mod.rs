//! Fixed aggregate reports over a loaded scan table
//!
//! [`ReportEngine`] introspects the table once and resolves every column it
//! needs against that column list before quoting it into SQL. Thresholds,
//! keywords, canonical values and limits are always bound parameters.
//!
//! | Report | Method |
//! |---|---|
//! | Severity histogram | [`ReportEngine::severity_counts`] |
//! | Top hosts | [`ReportEngine::host_ranking`] |
//! | Top vulnerabilities | [`ReportEngine::vulnerability_ranking`] |
//! | Vendor/technology breakdown | [`ReportEngine::type_counts`] |
//! | CVE year histogram | [`ReportEngine::year_counts`] |
//! | OS / severity / state crosstab | [`ReportEngine::os_state_crosstab`] |
//! | The same, one per operating system | [`ReportEngine::per_os_crosstabs`] |

mod crosstab;
mod hosts;
mod keywords;
mod severity;
mod vulnerabilities;
mod years;

pub use crosstab::{materialize_crosstab, OsCrosstab, OsStateCount, RESULT_TABLE};
pub use hosts::HostScore;
pub use keywords::{TypeCounts, TYPE_BUCKETS};
pub use severity::SeverityCounts;
pub use vulnerabilities::{VulnerabilityCount, RANKING_RANGE};
pub use years::YearCount;

use crate::error::{Error, Result};
use crate::schema::{ColumnType, TableSchema};
use crate::store;
use rusqlite::types::Value;
use rusqlite::Connection;
use scanrep_common::CvssBand;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Maximum entries in the host and vulnerability rankings
pub const TOP_N: i64 = 10;

/// Names of the scanner columns each report reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportColumns {
    pub host: String,
    pub cvss: String,
    pub name: String,
    pub cve: String,
    pub operating_system: String,
    pub severity: String,
    /// Crosstab state column; the table's last column when unset
    pub state: Option<String>,
}

impl Default for ReportColumns {
    fn default() -> Self {
        Self {
            host: "Host".to_string(),
            cvss: "CVSS".to_string(),
            name: "Name".to_string(),
            cve: "CVE".to_string(),
            operating_system: "asset_operating_system".to_string(),
            severity: "Severity".to_string(),
            state: None,
        }
    }
}

/// Every report for one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSet {
    pub table: String,
    pub severity: SeverityCounts,
    pub hosts: Vec<HostScore>,
    pub vulnerabilities: Vec<VulnerabilityCount>,
    pub types: TypeCounts,
    pub years: Vec<YearCount>,
    /// `None` when the table has no OS or severity column
    pub crosstab: Option<Vec<OsStateCount>>,
}

/// Read-only query layer over a loaded table
pub struct ReportEngine<'c> {
    conn: &'c Connection,
    schema: TableSchema,
    columns: ReportColumns,
}

impl<'c> ReportEngine<'c> {
    /// Bind to `table`, which must already exist
    pub fn open(conn: &'c Connection, table: &str, columns: ReportColumns) -> Result<Self> {
        let schema = store::introspect(conn, table)?;
        Ok(Self {
            conn,
            schema,
            columns,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn columns(&self) -> &ReportColumns {
        &self.columns
    }

    /// Run every report. The crosstab is skipped, not failed, when its
    /// columns are missing; any other failure aborts the whole set.
    #[instrument(skip(self), fields(table = %self.schema.name()))]
    pub fn run_all(&self) -> Result<ReportSet> {
        let crosstab = if self.has_crosstab_columns() {
            Some(self.os_state_crosstab()?)
        } else {
            warn!(
                os = %self.columns.operating_system,
                severity = %self.columns.severity,
                "Crosstab columns not present, skipping OS/state report"
            );
            None
        };

        let set = ReportSet {
            table: self.schema.name().to_string(),
            severity: self.severity_counts()?,
            hosts: self.host_ranking()?,
            vulnerabilities: self.vulnerability_ranking()?,
            types: self.type_counts()?,
            years: self.year_counts()?,
            crosstab,
        };

        info!(
            hosts = set.hosts.len(),
            vulnerabilities = set.vulnerabilities.len(),
            years = set.years.len(),
            "Reports complete"
        );
        Ok(set)
    }

    pub fn has_crosstab_columns(&self) -> bool {
        self.schema.has_column(&self.columns.operating_system)
            && self.schema.has_column(&self.columns.severity)
    }

    fn table(&self) -> Result<String> {
        self.schema.quoted_name()
    }

    fn column(&self, name: &str) -> Result<String> {
        self.schema.quoted_column(name)
    }

    /// Score column, which must carry numeric affinity for the band
    /// comparisons to mean anything
    fn cvss_column(&self) -> Result<String> {
        let column = self.schema.column(&self.columns.cvss)?;
        if column.column_type != ColumnType::Numeric {
            return Err(Error::schema(format!(
                "column '{}' must be NUMERIC to compute CVSS reports, found {}",
                column.name, column.column_type
            )));
        }
        self.column(&column.name)
    }
}

/// SQL condition selecting `band` on `cvss`, with its parameters
pub(crate) fn band_condition(cvss: &str, band: CvssBand) -> (String, Vec<Value>) {
    match band.bounds() {
        (exact, None) => (format!("{cvss} = ?"), vec![Value::Real(exact)]),
        (low, Some(high)) => (
            format!("{cvss} >= ? AND {cvss} < ?"),
            vec![Value::Real(low), Value::Real(high)],
        ),
    }
}

/// One `SUM(CASE ...)` per band, in [`CvssBand::ALL`] order
pub(crate) fn band_sums(cvss: &str) -> (Vec<String>, Vec<Value>) {
    let mut exprs = Vec::with_capacity(CvssBand::ALL.len());
    let mut params = Vec::new();

    for band in CvssBand::ALL {
        let (condition, values) = band_condition(cvss, band);
        exprs.push(format!(
            "COALESCE(SUM(CASE WHEN {condition} THEN 1 ELSE 0 END), 0)"
        ));
        params.extend(values);
    }

    (exprs, params)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the report tests

    use crate::loader::Loader;
    use crate::reader::ScanFile;
    use rusqlite::Connection;

    pub const TABLE: &str = "scan";

    pub fn load(header: &[&str], rows: &[&[&str]]) -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        let scan = ScanFile {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|f| f.to_string()).collect())
                .collect(),
        };
        Loader::new(TABLE).load_scan(&mut conn, &scan).unwrap();
        conn
    }
}
