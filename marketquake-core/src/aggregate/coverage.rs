//! Week coverage diagnostic.
//!
//! Reports how many of the window's weeks a series actually has. Purely
//! informational: acceptance is decided by `validate` alone.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::bucket::{week_of, WeekYearBasis};
use crate::data::AnalysisWindow;
use crate::domain::WeeklyAggregate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub expected_weeks: usize,
    pub present_weeks: usize,
    /// `(year, week)` pairs in the window with no row.
    pub missing: Vec<(i32, u32)>,
}

impl CoverageReport {
    pub fn is_full(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn ratio(&self) -> f64 {
        if self.expected_weeks == 0 {
            return 1.0;
        }
        self.present_weeks as f64 / self.expected_weeks as f64
    }
}

/// Every `(year, week)` that some day of the window maps to.
pub fn expected_weeks(window: &AnalysisWindow, basis: WeekYearBasis) -> BTreeSet<(i32, u32)> {
    window
        .start
        .iter_days()
        .take_while(|d| *d <= window.end)
        .map(|d| week_of(d, basis))
        .collect()
}

/// Compare a series' rows against the weeks the window spans.
pub fn coverage(
    rows: &[WeeklyAggregate],
    window: &AnalysisWindow,
    basis: WeekYearBasis,
) -> CoverageReport {
    let expected = expected_weeks(window, basis);
    let present: BTreeSet<(i32, u32)> = rows
        .iter()
        .map(|r| (r.year, r.week))
        .filter(|k| expected.contains(k))
        .collect();
    let missing = expected.difference(&present).copied().collect();

    CoverageReport {
        expected_weeks: expected.len(),
        present_weeks: present.len(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, week: u32) -> WeeklyAggregate {
        WeeklyAggregate {
            symbol: "GOOG".into(),
            year,
            week,
            volume: Some(1.0),
            low: Some(1.0),
            high: Some(1.0),
            open: Some(1.0),
            close: Some(1.0),
            adjusted_close: Some(1.0),
        }
    }

    #[test]
    fn default_window_spans_157_iso_weeks() {
        // 2020 has 53 ISO weeks, 2021 and 2022 have 52.
        let weeks = expected_weeks(&AnalysisWindow::default(), WeekYearBasis::Iso);
        assert_eq!(weeks.len(), 157);
        assert_eq!(weeks.first(), Some(&(2020, 1)));
        assert_eq!(weeks.last(), Some(&(2022, 52)));
    }

    #[test]
    fn reports_missing_weeks() {
        let window = AnalysisWindow::new(
            chrono::NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2020, 1, 26).unwrap(),
        )
        .unwrap();
        let report = coverage(&[row(2020, 2), row(2020, 4)], &window, WeekYearBasis::Iso);
        assert_eq!(report.expected_weeks, 3);
        assert_eq!(report.present_weeks, 2);
        assert_eq!(report.missing, vec![(2020, 3)]);
        assert!(!report.is_full());
        assert!((report.ratio() - 2.0 / 3.0).abs() < 1e-12);
    }
}
