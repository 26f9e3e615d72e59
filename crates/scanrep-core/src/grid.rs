//! Grid view of report results
//!
//! Every aggregate can be laid out as a sheet: header labels in row 1 and
//! data from row 2, addressed by 1-based [`CellRef`]s. Sinks (workbooks,
//! delimited text, terminal tables) consume [`ReportGrid`] without knowing
//! how the numbers were computed.

use crate::reader::{RawRecord, ScanFile};
use crate::report::{
    HostScore, OsCrosstab, OsStateCount, ReportSet, SeverityCounts, TypeCounts,
    VulnerabilityCount, YearCount,
};
use scanrep_common::CvssBand;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Row holding the header labels
pub const HEADER_ROW: u32 = 1;
/// First row holding data
pub const FIRST_DATA_ROW: u32 = 2;
/// Longest sheet name a workbook accepts
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Turn `title` into a sheet name workbooks accept and that is not yet in
/// `taken`.
///
/// `[ ] : * ? / \` become `_`, names are cut to [`MAX_SHEET_NAME_LEN`]
/// characters and clashes (compared case-insensitively) get a ` (n)` suffix.
pub fn unique_sheet_name(title: &str, taken: &mut HashSet<String>) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    let base = if cleaned.is_empty() { "Sheet" } else { cleaned };

    let mut candidate = truncate_chars(base, MAX_SHEET_NAME_LEN);
    let mut n = 2;
    while taken.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        candidate = format!(
            "{}{suffix}",
            truncate_chars(base, MAX_SHEET_NAME_LEN - suffix.chars().count())
        );
        n += 1;
    }

    taken.insert(candidate.to_lowercase());
    candidate
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect::<String>().trim_end().to_string()
}

/// 1-based cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Spreadsheet-style address, e.g. `B2` or `AA10`
    pub fn a1(&self) -> String {
        format!("{}{}", column_letters(self.col), self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.a1())
    }
}

/// Spreadsheet column name for a 1-based index (`1` → `A`, `27` → `AA`)
pub fn column_letters(col: u32) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Scalar written into one cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Integer when the text parses as one, otherwise the text unchanged
    pub fn infer(raw: &str) -> Self {
        raw.parse::<i64>()
            .map(CellValue::Integer)
            .unwrap_or_else(|_| CellValue::Text(raw.to_string()))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(v) => write!(f, "{v}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

/// A report laid out as one sheet
pub trait ReportGrid {
    fn sheet_name(&self) -> &str;

    /// Labels for [`HEADER_ROW`]
    fn headers(&self) -> Vec<String>;

    /// Data rows in display order
    fn rows(&self) -> Vec<Vec<CellValue>>;

    /// Data cells addressed from [`FIRST_DATA_ROW`], row-major
    fn cells(&self) -> Vec<(CellRef, CellValue)> {
        self.rows()
            .into_iter()
            .zip(FIRST_DATA_ROW..)
            .flat_map(|(row, r)| {
                row.into_iter()
                    .zip(1u32..)
                    .map(move |(value, c)| (CellRef::new(r, c), value))
            })
            .collect()
    }

    /// Header cells in [`HEADER_ROW`]
    fn header_cells(&self) -> Vec<(CellRef, CellValue)> {
        self.headers()
            .into_iter()
            .zip(1u32..)
            .map(|(label, c)| (CellRef::new(HEADER_ROW, c), CellValue::Text(label)))
            .collect()
    }
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn band_labels() -> Vec<String> {
    CvssBand::ALL.iter().map(|b| b.label().to_string()).collect()
}

impl ReportGrid for SeverityCounts {
    fn sheet_name(&self) -> &str {
        "CVSS By Severity"
    }

    fn headers(&self) -> Vec<String> {
        band_labels()
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        vec![CvssBand::ALL.iter().map(|b| CellValue::from(self.get(*b))).collect()]
    }
}

impl ReportGrid for Vec<HostScore> {
    fn sheet_name(&self) -> &str {
        "Top Vulnerable Hosts"
    }

    fn headers(&self) -> Vec<String> {
        let mut headers = labels(&["Host", "CVSS Total"]);
        headers.extend(band_labels());
        headers
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.iter()
            .map(|h| {
                vec![
                    CellValue::from(h.host.as_str()),
                    CellValue::from(h.cvss_total),
                    CellValue::from(h.critical),
                    CellValue::from(h.severe),
                    CellValue::from(h.high),
                    CellValue::from(h.medium),
                    CellValue::from(h.low),
                ]
            })
            .collect()
    }
}

impl ReportGrid for Vec<VulnerabilityCount> {
    fn sheet_name(&self) -> &str {
        "Most Common Vulnerabilities"
    }

    fn headers(&self) -> Vec<String> {
        labels(&["Vulnerability", "CVSS", "Count"])
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.iter()
            .map(|v| {
                vec![
                    CellValue::from(v.name.as_str()),
                    CellValue::from(v.max_cvss),
                    CellValue::from(v.count),
                ]
            })
            .collect()
    }
}

impl ReportGrid for TypeCounts {
    fn sheet_name(&self) -> &str {
        "Vulnerabilities By Type"
    }

    fn headers(&self) -> Vec<String> {
        self.labelled().iter().map(|(l, _)| l.to_string()).collect()
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        vec![self.labelled().iter().map(|(_, v)| CellValue::from(*v)).collect()]
    }
}

impl ReportGrid for Vec<YearCount> {
    fn sheet_name(&self) -> &str {
        "Vulnerabilities By Year"
    }

    fn headers(&self) -> Vec<String> {
        labels(&["Year", "Count"])
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.iter()
            .map(|y| vec![CellValue::infer(&y.year), CellValue::from(y.count)])
            .collect()
    }
}

impl ReportGrid for Vec<OsStateCount> {
    fn sheet_name(&self) -> &str {
        "OS State Crosstab"
    }

    fn headers(&self) -> Vec<String> {
        labels(&["Operating System", "Severity", "State", "Count"])
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.iter()
            .map(|r| {
                vec![
                    CellValue::from(r.operating_system.as_str()),
                    CellValue::from(r.severity.as_str()),
                    CellValue::from(r.state.as_str()),
                    CellValue::from(r.count),
                ]
            })
            .collect()
    }
}

impl ReportGrid for OsCrosstab {
    fn sheet_name(&self) -> &str {
        &self.sheet
    }

    fn headers(&self) -> Vec<String> {
        self.rows.headers()
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        ReportGrid::rows(&self.rows)
    }
}

/// The loaded export itself, as the "Scan Data" sheet
pub struct ScanDataGrid<'a> {
    header: &'a [String],
    rows: &'a [RawRecord],
}

impl<'a> ScanDataGrid<'a> {
    pub fn new(scan: &'a ScanFile) -> Self {
        Self {
            header: &scan.header,
            rows: &scan.rows,
        }
    }
}

impl ReportGrid for ScanDataGrid<'_> {
    fn sheet_name(&self) -> &str {
        "Scan Data"
    }

    fn headers(&self) -> Vec<String> {
        self.header.to_vec()
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|f| CellValue::infer(f)).collect())
            .collect()
    }
}

impl ReportSet {
    /// Every sheet in workbook order; the crosstab only when it was computed
    pub fn grids(&self) -> Vec<&dyn ReportGrid> {
        let mut grids: Vec<&dyn ReportGrid> = vec![
            &self.severity as &dyn ReportGrid,
            &self.hosts,
            &self.vulnerabilities,
            &self.types,
            &self.years,
        ];
        if let Some(crosstab) = &self.crosstab {
            grids.push(crosstab);
        }
        grids
    }
}
