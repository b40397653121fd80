//! View model for the board analysis screens.
//!
//! Turns rows fetched from the backend into classified, ordered rows and
//! the summary figures shown above the table.

use crate::api::{AtmReport, Board, FmecaRow, UserProfile};
use crate::risk::{decorate_coverage, BandFilter, CoverageStatus, RiskBand, RiskRecord, RpnLevel};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// An FMECA row together with its classification.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRow {
    #[serde(flatten)]
    pub row: FmecaRow,
    /// Parsed RPN, `None` if the raw value was not numeric
    pub rpn_value: Option<f64>,
    pub level: RpnLevel,
    pub band: RiskBand,
    pub coverage: CoverageStatus,
    pub coverage_display: String,
}

impl AnalysisRow {
    pub fn new(row: FmecaRow) -> Self {
        let record = RiskRecord::new(&row.rpn, row.atm_coverage.as_deref());

        Self {
            rpn_value: record.rpn,
            level: record.level(),
            band: record.band(),
            coverage: record.coverage_status(),
            coverage_display: record.coverage_display(),
            row,
        }
    }
}

/// Classify rows and order them by RPN, highest first.
///
/// Rows without a numeric RPN go last, keeping their original order.
pub fn analyze(rows: Vec<FmecaRow>) -> Vec<AnalysisRow> {
    let mut analyzed: Vec<AnalysisRow> = rows.into_iter().map(AnalysisRow::new).collect();
    analyzed.sort_by(|a, b| match (a.rpn_value, b.rpn_value) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    analyzed
}

/// Keep only the rows a band filter selects.
pub fn filter_rows(rows: Vec<AnalysisRow>, filter: BandFilter) -> Vec<AnalysisRow> {
    match filter.band() {
        None => rows,
        Some(band) => rows.into_iter().filter(|r| r.band == band).collect(),
    }
}

/// Counts shown above the analysis table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub filter: BandFilter,
    pub total: usize,
    pub by_band: BTreeMap<RiskBand, usize>,
    pub tested: usize,
    pub partial: usize,
    pub not_found: usize,
}

impl AnalysisSummary {
    pub fn from_rows(filter: BandFilter, rows: &[AnalysisRow]) -> Self {
        let mut by_band: BTreeMap<RiskBand, usize> =
            RiskBand::ALL.iter().map(|b| (*b, 0)).collect();
        let (mut tested, mut partial, mut not_found) = (0, 0, 0);

        for row in rows {
            *by_band.entry(row.band).or_insert(0) += 1;
            match row.coverage {
                CoverageStatus::Tested => tested += 1,
                CoverageStatus::Partial => partial += 1,
                CoverageStatus::NotFound => not_found += 1,
            }
        }

        Self {
            filter,
            total: rows.len(),
            by_band,
            tested,
            partial,
            not_found,
        }
    }

    pub fn count(&self, band: RiskBand) -> usize {
        self.by_band.get(&band).copied().unwrap_or(0)
    }

    /// e.g. `Active Filter: RED | Records Found: 12`
    pub fn status_line(&self) -> String {
        format!(
            "Active Filter: {} | Records Found: {}",
            self.filter.as_str().to_uppercase(),
            self.total
        )
    }
}

/// How much analysis data a board has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardDataStatus {
    /// Both FMECA and coverage data
    Complete,
    /// Exactly one of the two
    Partial,
    /// Neither
    Empty,
}

impl BoardDataStatus {
    pub fn of(board: &Board) -> Self {
        match (board.has_fmeca, board.has_coverage) {
            (true, true) => BoardDataStatus::Complete,
            (false, false) => BoardDataStatus::Empty,
            _ => BoardDataStatus::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoardDataStatus::Complete => "complete",
            BoardDataStatus::Partial => "partial",
            BoardDataStatus::Empty => "empty",
        }
    }
}

/// A component from the ATM cross-check with its classified coverage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtmRow {
    pub component: String,
    pub coverage: CoverageStatus,
    pub coverage_display: String,
}

/// Classify each missing component of an ATM report.
pub fn atm_rows(report: &AtmReport) -> Vec<AtmRow> {
    report
        .missing_components
        .iter()
        .map(|m| AtmRow {
            component: m.component.clone(),
            coverage: CoverageStatus::classify(m.atm_coverage.as_deref()),
            coverage_display: decorate_coverage(m.atm_coverage.as_deref()),
        })
        .collect()
}

/// Overview figures for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total_users: usize,
    pub admin_users: usize,
    /// Accounts with the plain `user` role
    pub regular_users: usize,
    pub total_boards: usize,
    /// Boards with FMECA or coverage data stored in the database
    pub boards_with_db_data: usize,
    pub fmeca_in_db: usize,
    pub coverage_in_db: usize,
}

impl AdminStats {
    pub fn from_catalog(users: &[UserProfile], boards: &[Board]) -> Self {
        Self {
            total_users: users.len(),
            admin_users: users.iter().filter(|u| u.is_admin()).count(),
            regular_users: users.iter().filter(|u| u.role == "user").count(),
            total_boards: boards.len(),
            boards_with_db_data: boards
                .iter()
                .filter(|b| b.has_fmeca_db || b.has_coverage_db)
                .count(),
            fmeca_in_db: boards.iter().filter(|b| b.has_fmeca_db).count(),
            coverage_in_db: boards.iter().filter(|b| b.has_coverage_db).count(),
        }
    }
}
