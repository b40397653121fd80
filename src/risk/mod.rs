//! Risk classification for FMECA rows.
//!
//! This module contains:
//! - RPN parsing with a lowest-band default for malformed values
//! - The three-level display split (70/50) and four-band filter split (70/60/50)
//! - ATM coverage status matching

pub mod coverage;
pub mod rpn;

// Re-export commonly used types
pub use coverage::{decorate_coverage, CoverageStatus};
pub use rpn::{parse_rpn, BandFilter, RiskBand, RpnLevel};

/// One table row as seen by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRecord {
    /// Parsed RPN, `None` when the raw value was not numeric
    pub rpn: Option<f64>,
    /// Coverage description, if the report had one
    pub coverage: Option<String>,
}

impl RiskRecord {
    pub fn new(raw_rpn: &str, coverage: Option<&str>) -> Self {
        Self {
            rpn: parse_rpn(raw_rpn),
            coverage: coverage.map(str::to_string),
        }
    }

    pub fn level(&self) -> RpnLevel {
        RpnLevel::from_value(self.rpn)
    }

    pub fn band(&self) -> RiskBand {
        RiskBand::from_value(self.rpn)
    }

    pub fn coverage_status(&self) -> CoverageStatus {
        CoverageStatus::classify(self.coverage.as_deref())
    }

    pub fn coverage_display(&self) -> String {
        decorate_coverage(self.coverage.as_deref())
    }
}
