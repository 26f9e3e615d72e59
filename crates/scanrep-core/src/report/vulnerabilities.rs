use super::{ReportEngine, TOP_N};
use crate::error::{Error, Result};
use rusqlite::params;
use serde::Serialize;
use tracing::{debug, instrument};

const REPORT: &str = "vulnerability_ranking";

/// Scores that qualify for the vulnerability ranking, inclusive on both ends
pub const RANKING_RANGE: (f64, f64) = (7.0, 10.0);

/// Occurrences of one vulnerability name among high-scoring rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VulnerabilityCount {
    pub name: String,
    /// Highest score seen for this name
    pub max_cvss: f64,
    pub count: i64,
}

impl ReportEngine<'_> {
    /// Most frequent names among rows scored 7 to 10, ties broken by name
    #[instrument(skip(self))]
    pub fn vulnerability_ranking(&self) -> Result<Vec<VulnerabilityCount>> {
        let name = self.column(&self.columns.name)?;
        let cvss = self.cvss_column()?;
        let sql = format!(
            "SELECT {name}, MAX({cvss}), COUNT(*) AS occurrences \
             FROM {table} \
             WHERE {cvss} >= ?1 AND {cvss} <= ?2 \
             GROUP BY {name} \
             ORDER BY occurrences DESC, {name} ASC \
             LIMIT ?3",
            table = self.table()?,
        );

        let (low, high) = RANKING_RANGE;
        let mut stmt = self.conn.prepare(&sql).map_err(Error::query(REPORT))?;
        let vulnerabilities = stmt
            .query_map(params![low, high, TOP_N], |row| {
                Ok(VulnerabilityCount {
                    name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    max_cvss: row.get(1)?,
                    count: row.get(2)?,
                })
            })
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(Error::query(REPORT))?;

        debug!(names = vulnerabilities.len(), "Ranked vulnerabilities");
        Ok(vulnerabilities)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::super::testing::*;
    use super::super::ReportColumns;
    use super::*;

    fn ranking(rows: &[&[&str]]) -> Vec<VulnerabilityCount> {
        let conn = load(&["Name", "CVSS"], rows);
        ReportEngine::open(&conn, TABLE, ReportColumns::default())
            .unwrap()
            .vulnerability_ranking()
            .unwrap()
    }

    #[test]
    fn test_counts_and_order() {
        let vulns = ranking(&[
            &["Heartbleed", "7.5"],
            &["Heartbleed", "9.8"],
            &["Shellshock", "10"],
            &["Shellshock", "8"],
            &["Shellshock", "7"],
            &["Weak cipher", "4"],
        ]);

        assert_eq!(vulns.len(), 2);
        assert_eq!(vulns[0].name, "Shellshock");
        assert_eq!(vulns[0].count, 3);
        assert_eq!(vulns[0].max_cvss, 10.0);
        assert_eq!(vulns[1].name, "Heartbleed");
        assert_eq!(vulns[1].max_cvss, 9.8);
    }

    #[test]
    fn test_range_is_inclusive() {
        let vulns = ranking(&[&["edge-low", "7"], &["edge-high", "10"], &["below", "6.9"]]);
        let names: Vec<_> = vulns.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["edge-high", "edge-low"]);
    }

    #[test]
    fn test_at_most_ten_names() {
        let names: Vec<String> = (0..12).map(|i| format!("vuln{i:02}")).collect();
        let rows: Vec<[&str; 2]> = names.iter().map(|n| [n.as_str(), "8"]).collect();
        let rows: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();

        let vulns = ranking(&rows);
        assert_eq!(vulns.len(), 10);
        assert_eq!(vulns[0].name, "vuln00");
    }
}
