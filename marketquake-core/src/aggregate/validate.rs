//! Completeness gate for one symbol's weekly series.
//!
//! A series is rejected if any weekly row has a null or NaN field. This is a data
//! quality check on the rows that exist, not a coverage check: a series with
//! missing weeks but no nulls is accepted. See `coverage` for the
//! informational week-coverage diagnostic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AggregateField, WeeklyAggregate};

/// Why a series was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum RejectReason {
    #[error("missing data: '{field}' is null or NaN in {year}-W{week:02}")]
    MissingData {
        year: i32,
        week: u32,
        field: AggregateField,
    },
}

/// Decision for one symbol's full weekly series.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Accepted(Vec<WeeklyAggregate>),
    Rejected(RejectReason),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }
}

/// Accept or reject a series based on nulls in its aggregated rows.
pub fn validate(aggregates: Vec<WeeklyAggregate>) -> ValidationOutcome {
    let first_null = aggregates
        .iter()
        .find_map(|row| row.first_null_field().map(|field| (row.year, row.week, field)));

    match first_null {
        Some((year, week, field)) => {
            ValidationOutcome::Rejected(RejectReason::MissingData { year, week, field })
        }
        None => ValidationOutcome::Accepted(aggregates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(week: u32) -> WeeklyAggregate {
        WeeklyAggregate {
            symbol: "AAPL".into(),
            year: 2020,
            week,
            volume: Some(1000.0),
            low: Some(9.0),
            high: Some(13.0),
            open: Some(10.0),
            close: Some(11.4),
            adjusted_close: Some(11.2),
        }
    }

    #[test]
    fn complete_series_is_accepted_unchanged() {
        let rows = vec![row(2), row(3)];
        match validate(rows.clone()) {
            ValidationOutcome::Accepted(kept) => assert_eq!(kept, rows),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn any_null_rejects_whole_series() {
        let mut bad = row(3);
        bad.volume = None;
        let outcome = validate(vec![row(2), bad, row(4)]);
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected(RejectReason::MissingData {
                year: 2020,
                week: 3,
                field: AggregateField::Volume,
            })
        );
    }

    #[test]
    fn nan_mean_rejects_whole_series() {
        let mut bad = row(4);
        bad.close = Some(f64::NAN);
        let outcome = validate(vec![row(2), row(3), bad]);
        assert_eq!(
            outcome,
            ValidationOutcome::Rejected(RejectReason::MissingData {
                year: 2020,
                week: 4,
                field: AggregateField::Close,
            })
        );
    }

    #[test]
    fn sparse_series_without_nulls_is_accepted() {
        // three weeks out of a possible ~157
        let outcome = validate(vec![row(2), row(20), row(40)]);
        assert!(outcome.is_accepted());
    }

    #[test]
    fn empty_series_is_accepted() {
        assert_eq!(validate(Vec::new()), ValidationOutcome::Accepted(Vec::new()));
    }

    #[test]
    fn reject_reason_names_field_and_week() {
        let reason = RejectReason::MissingData {
            year: 2021,
            week: 7,
            field: AggregateField::AdjustedClose,
        };
        assert_eq!(
            reason.to_string(),
            "missing data: 'Adjusted Close' is null or NaN in 2021-W07"
        );
    }
}
