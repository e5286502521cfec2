//! Daily records: the unit of input for the weekly pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day for one symbol, exactly as read from the source file.
///
/// Numeric cells that are empty or not parseable are `None`. They are carried
/// through as nulls rather than rejected here; the completeness gate decides
/// later whether a symbol with nulls is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub symbol: String,
    pub date: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
    pub volume: Option<f64>,
}

/// A raw record whose date parsed to a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
    pub volume: Option<f64>,
}

impl NormalizedRecord {
    /// Build from a raw record and its already-parsed date.
    pub fn from_raw(raw: RawRecord, date: NaiveDate) -> Self {
        Self {
            symbol: raw.symbol,
            date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            adjusted_close: raw.adjusted_close,
            volume: raw.volume,
        }
    }

    /// Returns true if any numeric cell of this day is null.
    pub fn has_nulls(&self) -> bool {
        self.open.is_none()
            || self.high.is_none()
            || self.low.is_none()
            || self.close.is_none()
            || self.adjusted_close.is_none()
            || self.volume.is_none()
    }
}
