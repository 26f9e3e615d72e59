//! Vulnerability vocabulary shared by the loader, the reports and the sinks

use crate::error::CommonError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Severity
// ============================================================================

/// Canonical severity labels as exported by the scanner.
///
/// Only these four values take part in the OS/state crosstab; anything else
/// in the severity column (e.g. `Info`) is ignored by that report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Exact spelling stored in scan exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(CommonError::UnknownSeverity(s.to_string())),
        }
    }
}

// ============================================================================
// Scan state
// ============================================================================

/// Lifecycle state of a finding between two scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanState {
    Active,
    Resurfaced,
    Fixed,
    New,
}

impl ScanState {
    pub const ALL: [ScanState; 4] = [
        ScanState::Active,
        ScanState::Resurfaced,
        ScanState::Fixed,
        ScanState::New,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanState::Active => "ACTIVE",
            ScanState::Resurfaced => "RESURFACED",
            ScanState::Fixed => "FIXED",
            ScanState::New => "NEW",
        }
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanState {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(ScanState::Active),
            "RESURFACED" => Ok(ScanState::Resurfaced),
            "FIXED" => Ok(ScanState::Fixed),
            "NEW" => Ok(ScanState::New),
            _ => Err(CommonError::UnknownState(s.to_string())),
        }
    }
}

// ============================================================================
// CVSS bands
// ============================================================================

/// Score ranges used by the severity histogram and the host ranking.
///
/// | Band     | Range      |
/// |----------|------------|
/// | Critical | `= 10`     |
/// | Severe   | `[9, 10)`  |
/// | High     | `[7, 9)`   |
/// | Medium   | `[4, 7)`   |
/// | Low      | `[0, 4)`   |
///
/// The SQL predicates are built from [`CvssBand::bounds`], so the in-memory
/// classifier and the database agree on every boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvssBand {
    Critical,
    Severe,
    High,
    Medium,
    Low,
}

impl CvssBand {
    pub const ALL: [CvssBand; 5] = [
        CvssBand::Critical,
        CvssBand::Severe,
        CvssBand::High,
        CvssBand::Medium,
        CvssBand::Low,
    ];

    /// Lower bound (inclusive) and upper bound (exclusive).
    ///
    /// `None` as the upper bound means an exact match on the lower bound.
    pub fn bounds(&self) -> (f64, Option<f64>) {
        match self {
            CvssBand::Critical => (10.0, None),
            CvssBand::Severe => (9.0, Some(10.0)),
            CvssBand::High => (7.0, Some(9.0)),
            CvssBand::Medium => (4.0, Some(7.0)),
            CvssBand::Low => (0.0, Some(4.0)),
        }
    }

    /// Band a score falls into, `None` outside `[0, 10]`
    pub fn classify(score: f64) -> Option<CvssBand> {
        Self::ALL.into_iter().find(|band| band.contains(score))
    }

    pub fn contains(&self, score: f64) -> bool {
        match self.bounds() {
            (exact, None) => score == exact,
            (low, Some(high)) => score >= low && score < high,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CvssBand::Critical => "critical",
            CvssBand::Severe => "severe",
            CvssBand::High => "high",
            CvssBand::Medium => "medium",
            CvssBand::Low => "low",
        }
    }

    /// Display label used as a report column heading
    pub fn label(&self) -> &'static str {
        match self {
            CvssBand::Critical => "Critical",
            CvssBand::Severe => "Severe",
            CvssBand::High => "High",
            CvssBand::Medium => "Medium",
            CvssBand::Low => "Low",
        }
    }
}

impl std::fmt::Display for CvssBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_severity_from_str() {
        assert_eq!("Critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("medium".parse::<Severity>().unwrap(), Severity::Medium);
        assert!("Info".parse::<Severity>().is_err());
    }

    #[test]
    fn test_scan_state_round_trip() {
        for state in ScanState::ALL {
            assert_eq!(state.as_str().parse::<ScanState>().unwrap(), state);
        }
        assert_eq!("resurfaced".parse::<ScanState>().unwrap(), ScanState::Resurfaced);
        assert!("CLOSED".parse::<ScanState>().is_err());
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(CvssBand::classify(10.0), Some(CvssBand::Critical));
        assert_eq!(CvssBand::classify(9.99), Some(CvssBand::Severe));
        assert_eq!(CvssBand::classify(9.5), Some(CvssBand::Severe));
        assert_eq!(CvssBand::classify(9.0), Some(CvssBand::Severe));
        assert_eq!(CvssBand::classify(8.95), Some(CvssBand::High));
        assert_eq!(CvssBand::classify(7.0), Some(CvssBand::High));
        assert_eq!(CvssBand::classify(6.9), Some(CvssBand::Medium));
        assert_eq!(CvssBand::classify(4.0), Some(CvssBand::Medium));
        assert_eq!(CvssBand::classify(3.9), Some(CvssBand::Low));
        assert_eq!(CvssBand::classify(0.0), Some(CvssBand::Low));
    }

    #[test]
    fn test_band_out_of_domain() {
        assert_eq!(CvssBand::classify(-0.1), None);
        assert_eq!(CvssBand::classify(10.1), None);
        assert_eq!(CvssBand::classify(f64::NAN), None);
    }

    proptest! {
        #[test]
        fn every_score_in_domain_has_exactly_one_band(score in 0.0f64..=10.0) {
            let hits = CvssBand::ALL.iter().filter(|band| band.contains(score)).count();
            prop_assert_eq!(hits, 1);
        }
    }
}
