use super::ReportEngine;
use crate::error::{Error, Result};
use crate::grid::unique_sheet_name;
use crate::ident;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use scanrep_common::{ScanState, Severity};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

const REPORT: &str = "os_state_crosstab";

/// Default table that receives a materialized crosstab
pub const RESULT_TABLE: &str = "ResultTable";

/// Findings for one (operating system, severity, state) combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsStateCount {
    pub operating_system: String,
    pub severity: Severity,
    pub state: ScanState,
    pub count: i64,
}

/// Crosstab for a single operating system, laid out on its own sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsCrosstab {
    pub operating_system: String,
    /// Workbook-safe sheet name, unique within one report set
    pub sheet: String,
    pub rows: Vec<OsStateCount>,
}

impl ReportEngine<'_> {
    /// Crosstab over every operating system
    pub fn os_state_crosstab(&self) -> Result<Vec<OsStateCount>> {
        self.crosstab(None)
    }

    /// Crosstab restricted to one operating system
    pub fn os_state_crosstab_for(&self, operating_system: &str) -> Result<Vec<OsStateCount>> {
        self.crosstab(Some(operating_system))
    }

    /// One crosstab per distinct operating system.
    ///
    /// Systems without any canonical severity/state rows are left out. Empty
    /// when the table lacks the OS or severity column.
    #[instrument(skip(self))]
    pub fn per_os_crosstabs(&self) -> Result<Vec<OsCrosstab>> {
        if !self.has_crosstab_columns() {
            warn!(
                os = %self.columns.operating_system,
                "Crosstab columns not present, skipping per-OS reports"
            );
            return Ok(Vec::new());
        }

        let mut taken = HashSet::new();
        let mut crosstabs = Vec::new();
        for operating_system in self.distinct_values(&self.columns.operating_system)? {
            let rows = self.os_state_crosstab_for(&operating_system)?;
            if rows.is_empty() {
                debug!(os = %operating_system, "No canonical rows, skipping");
                continue;
            }

            let sheet = unique_sheet_name(&format!("OS {operating_system}"), &mut taken);
            crosstabs.push(OsCrosstab {
                operating_system,
                sheet,
                rows,
            });
        }

        info!(systems = crosstabs.len(), "Computed per-OS crosstabs");
        Ok(crosstabs)
    }

    /// Distinct non-null values of `column`, sorted
    #[instrument(skip(self))]
    pub fn distinct_values(&self, column: &str) -> Result<Vec<String>> {
        let quoted = self.column(column)?;
        let sql = format!(
            "SELECT DISTINCT {quoted} FROM {table} WHERE {quoted} IS NOT NULL ORDER BY {quoted}",
            table = self.table()?,
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(Error::query("distinct_values"))?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(Error::query("distinct_values"))?;

        Ok(values)
    }

    fn state_column(&self) -> Result<String> {
        match &self.columns.state {
            Some(name) => self.column(name),
            None => {
                let last = self
                    .schema
                    .last_column()
                    .ok_or_else(|| Error::schema("table has no columns"))?;
                ident::quote(&last.name)
            },
        }
    }

    #[instrument(skip(self))]
    fn crosstab(&self, operating_system: Option<&str>) -> Result<Vec<OsStateCount>> {
        let os = self.column(&self.columns.operating_system)?;
        let severity = self.column(&self.columns.severity)?;
        let state = self.state_column()?;

        let mut params: Vec<Value> = Severity::ALL
            .iter()
            .map(|s| Value::Text(s.as_str().to_string()))
            .chain(ScanState::ALL.iter().map(|s| Value::Text(s.as_str().to_string())))
            .collect();

        let os_filter = match operating_system {
            Some(value) => {
                params.push(Value::Text(value.to_string()));
                format!(" AND {os} = ?")
            },
            None => String::new(),
        };

        let sql = format!(
            "SELECT {os}, {severity}, {state}, COUNT(*) \
             FROM {table} \
             WHERE {severity} IN ({severities}) AND {state} IN ({states}){os_filter} \
             GROUP BY {os}, {severity}, {state} \
             ORDER BY {os}, {severity}, {state}",
            table = self.table()?,
            severities = placeholders(Severity::ALL.len()),
            states = placeholders(ScanState::ALL.len()),
        );

        let mut stmt = self.conn.prepare(&sql).map_err(Error::query(REPORT))?;
        let rows = stmt
            .query_map(params_from_iter(params), map_crosstab_row)
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(Error::query(REPORT))?;

        debug!(combinations = rows.len(), "Computed OS/state crosstab");
        Ok(rows)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn map_crosstab_row(row: &Row<'_>) -> rusqlite::Result<OsStateCount> {
    let severity: String = row.get(1)?;
    let state: String = row.get(2)?;

    Ok(OsStateCount {
        operating_system: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        severity: severity
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?,
        state: state
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        count: row.get(3)?,
    })
}

/// Store crosstab rows in `result_table`, replacing whatever it held.
///
/// The table is created on first use. Clearing and inserting happen in one
/// transaction, so readers never see a half-written result.
#[instrument(skip(conn, rows), fields(rows = rows.len()))]
pub fn materialize_crosstab(
    conn: &Connection,
    result_table: &str,
    rows: &[OsStateCount],
) -> Result<usize> {
    let table = ident::quote(result_table)?;
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             OperatingSystem TEXT, Severity TEXT, State TEXT, Count INTEGER)"
        ),
        [],
    )?;
    let cleared = tx.execute(&format!("DELETE FROM {table}"), [])?;

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (OperatingSystem, Severity, State, Count) VALUES (?1, ?2, ?3, ?4)"
        ))?;
        for (idx, row) in rows.iter().enumerate() {
            stmt.execute(params![
                row.operating_system,
                row.severity.as_str(),
                row.state.as_str(),
                row.count
            ])
            .map_err(|source| Error::Insert { row: idx, source })?;
        }
    }

    tx.commit()?;
    info!(table = result_table, cleared, inserted = rows.len(), "Materialized crosstab");
    Ok(rows.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::super::testing::*;
    use super::super::ReportColumns;
    use super::*;

    const HEADER: [&str; 4] = ["Host", "asset.operating_system", "Severity", "state"];

    fn fixture() -> Connection {
        load(
            &HEADER,
            &[
                &["h1", "Linux", "Critical", "ACTIVE"],
                &["h2", "Linux", "Critical", "ACTIVE"],
                &["h3", "Linux", "High", "FIXED"],
                &["h4", "Windows", "Low", "NEW"],
                &["h5", "Windows", "Info", "NEW"],
                &["h6", "Windows", "Medium", "IGNORED"],
                &["h7", "Windows", "critical", "NEW"],
            ],
        )
    }

    fn count(rows: &[OsStateCount], os: &str, severity: Severity, state: ScanState) -> i64 {
        rows.iter()
            .find(|r| r.operating_system == os && r.severity == severity && r.state == state)
            .map(|r| r.count)
            .unwrap_or(0)
    }

    #[test]
    fn test_crosstab_groups_canonical_values_only() {
        let conn = fixture();
        let engine = ReportEngine::open(&conn, TABLE, ReportColumns::default()).unwrap();
        let rows = engine.os_state_crosstab().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(count(&rows, "Linux", Severity::Critical, ScanState::Active), 2);
        assert_eq!(count(&rows, "Linux", Severity::High, ScanState::Fixed), 1);
        assert_eq!(count(&rows, "Windows", Severity::Low, ScanState::New), 1);
    }

    #[test]
    fn test_crosstab_for_one_os() {
        let conn = fixture();
        let engine = ReportEngine::open(&conn, TABLE, ReportColumns::default()).unwrap();
        let rows = engine.os_state_crosstab_for("Windows").unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].operating_system, "Windows");
    }

    #[test]
    fn test_explicit_state_column() {
        let conn = load(
            &["asset.operating_system", "Severity", "state", "notes"],
            &[&["Linux", "High", "NEW", "x"]],
        );
        let columns = ReportColumns {
            state: Some("state".to_string()),
            ..Default::default()
        };
        let engine = ReportEngine::open(&conn, TABLE, columns).unwrap();
        assert_eq!(engine.os_state_crosstab().unwrap().len(), 1);

        let engine = ReportEngine::open(&conn, TABLE, ReportColumns::default()).unwrap();
        assert!(engine.os_state_crosstab().unwrap().is_empty());
    }

    #[test]
    fn test_per_os_crosstabs() {
        let conn = fixture();
        let engine = ReportEngine::open(&conn, TABLE, ReportColumns::default()).unwrap();
        let per_os = engine.per_os_crosstabs().unwrap();

        let sheets: Vec<&str> = per_os.iter().map(|c| c.sheet.as_str()).collect();
        assert_eq!(sheets, vec!["OS Linux", "OS Windows"]);
        assert_eq!(per_os[0].rows.len(), 2);
        assert!(per_os[0].rows.iter().all(|r| r.operating_system == "Linux"));
        assert_eq!(count(&per_os[1].rows, "Windows", Severity::Low, ScanState::New), 1);
    }

    #[test]
    fn test_per_os_skips_systems_without_canonical_rows() {
        let conn = load(
            &HEADER,
            &[
                &["h1", "Linux", "High", "NEW"],
                &["h2", "Solaris", "Info", "NEW"],
                &["h3", "Windows: Server/2019", "Low", "FIXED"],
            ],
        );
        let engine = ReportEngine::open(&conn, TABLE, ReportColumns::default()).unwrap();
        let per_os = engine.per_os_crosstabs().unwrap();

        let sheets: Vec<&str> = per_os.iter().map(|c| c.sheet.as_str()).collect();
        assert_eq!(sheets, vec!["OS Linux", "OS Windows_ Server_2019"]);
        assert_eq!(per_os[1].operating_system, "Windows: Server/2019");
    }

    #[test]
    fn test_per_os_without_os_column() {
        let conn = load(&["Host", "CVSS"], &[&["h1", "5"]]);
        let engine = ReportEngine::open(&conn, TABLE, ReportColumns::default()).unwrap();
        assert!(engine.per_os_crosstabs().unwrap().is_empty());
    }

    #[test]
    fn test_distinct_values() {
        let conn = fixture();
        let engine = ReportEngine::open(&conn, TABLE, ReportColumns::default()).unwrap();

        assert_eq!(
            engine.distinct_values("asset_operating_system").unwrap(),
            vec!["Linux", "Windows"]
        );
        assert!(engine.distinct_values("missing").is_err());
    }

    #[test]
    fn test_materialize_replaces_previous_rows() {
        let conn = fixture();
        let engine = ReportEngine::open(&conn, TABLE, ReportColumns::default()).unwrap();
        let rows = engine.os_state_crosstab().unwrap();

        assert_eq!(materialize_crosstab(&conn, RESULT_TABLE, &rows).unwrap(), 3);
        assert_eq!(materialize_crosstab(&conn, RESULT_TABLE, &rows[..1]).unwrap(), 1);

        let (stored, total): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), SUM(Count) FROM ResultTable",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(stored, 1);
        assert_eq!(total, rows[0].count);
    }
}
