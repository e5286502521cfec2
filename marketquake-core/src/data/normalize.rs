//! Date normalization and the analysis window.
//!
//! Raw dates arrive as strings in the source's day-first format. A date that
//! cannot be parsed makes only that record invalid; the rest of the series is
//! kept. Records outside the analysis window are dropped without complaint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{NormalizedRecord, RawRecord};

/// Day-first format used by the source files, e.g. `06-01-2020`.
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";

/// A record's date could not be interpreted with the expected format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse date '{raw}' with format '{format}'")]
pub struct ParseFailure {
    pub raw: String,
    pub format: String,
}

/// Parse one raw date string.
pub fn parse_date(raw: &str, format: &str) -> Result<NaiveDate, ParseFailure> {
    NaiveDate::parse_from_str(raw.trim(), format).map_err(|_| ParseFailure {
        raw: raw.to_string(),
        format: format.to_string(),
    })
}

/// Attach a parsed date to a raw record.
pub fn normalize(raw: RawRecord, format: &str) -> Result<NormalizedRecord, ParseFailure> {
    let date = parse_date(&raw.date, format)?;
    Ok(NormalizedRecord::from_raw(raw, date))
}

/// Inclusive `[start, end]` date range records must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("window start {start} is after window end {end}")]
pub struct InvalidWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidWindow> {
        if start > end {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Keep only records dated inside the window.
    pub fn filter(&self, records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
        records
            .into_iter()
            .filter(|r| self.contains(r.date))
            .collect()
    }
}

impl Default for AnalysisWindow {
    /// January 2020 through December 2022.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).expect("2020-01-01 is a valid date"),
            end: NaiveDate::from_ymd_opt(2022, 12, 31).expect("2022-12-31 is a valid date"),
        }
    }
}

/// Records that survived normalization, plus what was dropped on the way.
#[derive(Debug, Default)]
pub struct NormalizedSeries {
    pub records: Vec<NormalizedRecord>,
    pub parse_failures: Vec<ParseFailure>,
    pub outside_window: usize,
}

/// Normalize every record of one series and apply the window.
pub fn normalize_series(
    raw: Vec<RawRecord>,
    format: &str,
    window: &AnalysisWindow,
) -> NormalizedSeries {
    let mut out = NormalizedSeries::default();
    for record in raw {
        match normalize(record, format) {
            Ok(rec) if window.contains(rec.date) => out.records.push(rec),
            Ok(_) => out.outside_window += 1,
            Err(failure) => out.parse_failures.push(failure),
        }
    }
    out
}
