//! Risk-priority-number parsing and banding.
//!
//! RPN values arrive from the backend as text (`"72.0"`, `"nan"`, `"45"`)
//! or occasionally as JSON numbers. Classification never fails: anything
//! without a leading number falls into the lowest level and band.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lower bound (inclusive) of the high level and the red band.
pub const HIGH_THRESHOLD: f64 = 70.0;
/// Lower bound (inclusive) of the orange band.
pub const ORANGE_THRESHOLD: f64 = 60.0;
/// Lower bound (inclusive) of the medium level and the yellow band.
pub const MEDIUM_THRESHOLD: f64 = 50.0;

/// Parse an RPN using leading-number semantics.
///
/// Leading whitespace is skipped and the longest leading decimal literal is
/// used, so `"72.5 (est)"` yields `72.5`. Returns `None` when there is no
/// leading number or the value is NaN.
pub fn parse_rpn(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            Some(f64::NEG_INFINITY)
        } else {
            Some(f64::INFINITY)
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Three-level display classification of an RPN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpnLevel {
    Low,
    Medium,
    High,
}

impl RpnLevel {
    /// Classify an already-parsed value. `None` is the lowest level.
    pub fn from_value(value: Option<f64>) -> Self {
        match value {
            Some(v) if v >= HIGH_THRESHOLD => RpnLevel::High,
            Some(v) if v >= MEDIUM_THRESHOLD => RpnLevel::Medium,
            _ => RpnLevel::Low,
        }
    }

    /// Classify raw RPN text.
    pub fn classify(raw: &str) -> Self {
        Self::from_value(parse_rpn(raw))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RpnLevel::High => "high",
            RpnLevel::Medium => "medium",
            RpnLevel::Low => "low",
        }
    }
}

impl fmt::Display for RpnLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-way red/orange/yellow/green band used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Green,
    Yellow,
    Orange,
    Red,
}

impl RiskBand {
    /// All bands, highest risk first.
    pub const ALL: [RiskBand; 4] = [
        RiskBand::Red,
        RiskBand::Orange,
        RiskBand::Yellow,
        RiskBand::Green,
    ];

    /// Classify an already-parsed value. `None` is the lowest band.
    pub fn from_value(value: Option<f64>) -> Self {
        match value {
            Some(v) if v >= HIGH_THRESHOLD => RiskBand::Red,
            Some(v) if v >= ORANGE_THRESHOLD => RiskBand::Orange,
            Some(v) if v >= MEDIUM_THRESHOLD => RiskBand::Yellow,
            _ => RiskBand::Green,
        }
    }

    /// Classify raw RPN text.
    pub fn classify(raw: &str) -> Self {
        Self::from_value(parse_rpn(raw))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Red => "red",
            RiskBand::Orange => "orange",
            RiskBand::Yellow => "yellow",
            RiskBand::Green => "green",
        }
    }

    /// Marker shown next to the band in listings.
    pub fn glyph(&self) -> &'static str {
        match self {
            RiskBand::Red => "🔴",
            RiskBand::Orange => "🟠",
            RiskBand::Yellow => "🟡",
            RiskBand::Green => "🟢",
        }
    }

    /// Human-readable value range.
    pub fn range(&self) -> &'static str {
        match self {
            RiskBand::Red => "Value ≥ 70",
            RiskBand::Orange => "70 > Value ≥ 60",
            RiskBand::Yellow => "60 > Value ≥ 50",
            RiskBand::Green => "Value < 50",
        }
    }

    /// The coarser display level this band belongs to.
    pub fn level(&self) -> RpnLevel {
        match self {
            RiskBand::Red => RpnLevel::High,
            RiskBand::Orange | RiskBand::Yellow => RpnLevel::Medium,
            RiskBand::Green => RpnLevel::Low,
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band selection sent to the backend as `filter_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandFilter {
    #[default]
    All,
    Red,
    Orange,
    Yellow,
    Green,
}

impl BandFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandFilter::All => "all",
            BandFilter::Red => "red",
            BandFilter::Orange => "orange",
            BandFilter::Yellow => "yellow",
            BandFilter::Green => "green",
        }
    }

    /// The single band this filter selects, if any.
    pub fn band(&self) -> Option<RiskBand> {
        match self {
            BandFilter::All => None,
            BandFilter::Red => Some(RiskBand::Red),
            BandFilter::Orange => Some(RiskBand::Orange),
            BandFilter::Yellow => Some(RiskBand::Yellow),
            BandFilter::Green => Some(RiskBand::Green),
        }
    }

    /// Whether a raw RPN passes this filter.
    pub fn matches(&self, raw_rpn: &str) -> bool {
        match self.band() {
            None => true,
            Some(band) => RiskBand::classify(raw_rpn) == band,
        }
    }
}

impl From<RiskBand> for BandFilter {
    fn from(band: RiskBand) -> Self {
        match band {
            RiskBand::Red => BandFilter::Red,
            RiskBand::Orange => BandFilter::Orange,
            RiskBand::Yellow => BandFilter::Yellow,
            RiskBand::Green => BandFilter::Green,
        }
    }
}

impl FromStr for BandFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "reset" => Ok(BandFilter::All),
            "red" => Ok(BandFilter::Red),
            "orange" => Ok(BandFilter::Orange),
            "yellow" => Ok(BandFilter::Yellow),
            "green" => Ok(BandFilter::Green),
            other => Err(format!(
                "unknown band filter '{other}' (expected all, red, orange, yellow or green)"
            )),
        }
    }
}

impl fmt::Display for BandFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
