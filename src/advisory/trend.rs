//! Keyword-selected chart series.
//!
//! Not a computed statistic: the advisory text is scanned for the words
//! "worsening" / "improving" and one of three fixed seven-point series is
//! returned for the dashboard chart.

use serde::Serialize;

pub const WORSENING_TREND: [u8; 7] = [8, 7, 6, 5, 4, 3, 2];
pub const IMPROVING_TREND: [u8; 7] = [2, 3, 4, 5, 6, 7, 8];
pub const STABLE_TREND: [u8; 7] = [5, 5, 5, 5, 5, 5, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
}

impl Trend {
    /// Classify advisory text. "worsening" is checked first, so text
    /// mentioning both words charts as worsening.
    pub fn from_advice(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("worsening") {
            Self::Worsening
        } else if lower.contains("improving") {
            Self::Improving
        } else {
            Self::Stable
        }
    }

    pub fn series(self) -> [u8; 7] {
        match self {
            Self::Worsening => WORSENING_TREND,
            Self::Improving => IMPROVING_TREND,
            Self::Stable => STABLE_TREND,
        }
    }
}
