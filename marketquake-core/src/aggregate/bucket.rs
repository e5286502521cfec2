//! ISO-8601 week bucketing.
//!
//! Weeks run Monday to Sunday and week 1 is the week containing the year's
//! first Thursday, so a late-December date can fall in week 1 of the next
//! ISO year and an early-January date in week 52/53 of the previous one.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{NormalizedRecord, WeekKey};

/// Which year is paired with the ISO week number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekYearBasis {
    /// ISO week-numbering year. Every bucket is exactly one Monday–Sunday week.
    #[default]
    Iso,
    /// Calendar year of the date. Matches older dataframe exports that paired
    /// `year(date)` with `weekofyear(date)`; days of a week that straddles
    /// New Year land in two different buckets.
    Calendar,
}

/// `(year, iso_week)` for a date.
pub fn week_of(date: NaiveDate, basis: WeekYearBasis) -> (i32, u32) {
    let iso = date.iso_week();
    let year = match basis {
        WeekYearBasis::Iso => iso.year(),
        WeekYearBasis::Calendar => date.year(),
    };
    (year, iso.week())
}

/// Bucket key for a normalized record.
pub fn week_key(record: &NormalizedRecord, basis: WeekYearBasis) -> WeekKey {
    let (year, week) = week_of(record.date, basis);
    WeekKey::new(record.symbol.clone(), year, week)
}
