//! ATM coverage status classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a component in the ATM coverage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Tested,
    Partial,
    NotFound,
}

impl CoverageStatus {
    /// Classify a coverage description by substring match.
    ///
    /// Order matters: a text containing both `Tested` and `Partially`
    /// (e.g. "Partially Tested") is partial, not tested.
    pub fn classify(coverage: Option<&str>) -> Self {
        let text = match coverage {
            Some(t) if !t.is_empty() => t,
            _ => return CoverageStatus::NotFound,
        };

        if text.contains("Tested") && !text.contains("Partially") {
            CoverageStatus::Tested
        } else if text.contains("Partially") {
            CoverageStatus::Partial
        } else {
            CoverageStatus::NotFound
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Tested => "tested",
            CoverageStatus::Partial => "partial",
            CoverageStatus::NotFound => "not found",
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            CoverageStatus::Tested => '✓',
            CoverageStatus::Partial => '⚠',
            CoverageStatus::NotFound => '✗',
        }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coverage text with its status glyph, e.g. `✓ Tested`.
pub fn decorate_coverage(coverage: Option<&str>) -> String {
    let status = CoverageStatus::classify(coverage);
    match coverage {
        Some(text) if !text.is_empty() => format!("{} {}", status.glyph(), text),
        _ => format!("{} Not Found", status.glyph()),
    }
}
