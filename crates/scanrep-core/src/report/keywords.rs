use super::ReportEngine;
use crate::error::{Error, Result};
use rusqlite::params_from_iter;
use serde::Serialize;
use tracing::{debug, instrument};

const REPORT: &str = "type_counts";

/// Vendor and technology buckets, each matched by any of its `LIKE` patterns.
///
/// The SSL bucket also counts TLS findings.
pub const TYPE_BUCKETS: [(&str, &[&str]); 8] = [
    ("Oracle", &["%Oracle%"]),
    ("Microsoft", &["%Microsoft%"]),
    ("SSL", &["%SSL%", "%TLS%"]),
    ("Firefox", &["%Firefox%"]),
    ("SMB", &["%SMB%"]),
    ("Apache", &["%Apache%"]),
    ("PHP", &["%PHP%"]),
    ("Adobe", &["%Adobe%"]),
];

/// Rows whose vulnerability name mentions each vendor or technology.
/// Matching is case-insensitive for ASCII and a row can land in several
/// buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub oracle: i64,
    pub microsoft: i64,
    pub ssl: i64,
    pub firefox: i64,
    pub smb: i64,
    pub apache: i64,
    pub php: i64,
    pub adobe: i64,
}

impl TypeCounts {
    /// Counts paired with their labels, in [`TYPE_BUCKETS`] order
    pub fn labelled(&self) -> [(&'static str, i64); 8] {
        let values = [
            self.oracle,
            self.microsoft,
            self.ssl,
            self.firefox,
            self.smb,
            self.apache,
            self.php,
            self.adobe,
        ];
        let mut out = [("", 0); 8];
        for (slot, ((label, _), value)) in out.iter_mut().zip(TYPE_BUCKETS.iter().zip(values)) {
            *slot = (*label, value);
        }
        out
    }
}

impl ReportEngine<'_> {
    #[instrument(skip(self))]
    pub fn type_counts(&self) -> Result<TypeCounts> {
        let name = self.column(&self.columns.name)?;

        let mut exprs = Vec::with_capacity(TYPE_BUCKETS.len());
        let mut patterns = Vec::new();
        for (_, bucket) in TYPE_BUCKETS.iter() {
            let condition = bucket
                .iter()
                .map(|_| format!("{name} LIKE ?"))
                .collect::<Vec<_>>()
                .join(" OR ");
            exprs.push(format!(
                "COALESCE(SUM(CASE WHEN {condition} THEN 1 ELSE 0 END), 0)"
            ));
            patterns.extend(bucket.iter().copied());
        }

        let sql = format!("SELECT {} FROM {}", exprs.join(", "), self.table()?);
        debug!(%sql, "Counting vulnerability types");

        let counts = self
            .conn
            .query_row(&sql, params_from_iter(patterns), |row| {
                Ok(TypeCounts {
                    oracle: row.get(0)?,
                    microsoft: row.get(1)?,
                    ssl: row.get(2)?,
                    firefox: row.get(3)?,
                    smb: row.get(4)?,
                    apache: row.get(5)?,
                    php: row.get(6)?,
                    adobe: row.get(7)?,
                })
            })
            .map_err(Error::query(REPORT))?;

        Ok(counts)
    }
}
