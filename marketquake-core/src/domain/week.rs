//! Week keys identify one aggregation bucket.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `(symbol, year, week)`, one aggregation bucket.
///
/// Ordering is by symbol, then year, then week, so a `BTreeMap<WeekKey, _>`
/// iterates each symbol's weeks chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub symbol: String,
    pub year: i32,
    /// ISO week number, 1..=53.
    pub week: u32,
}

impl WeekKey {
    pub fn new(symbol: impl Into<String>, year: i32, week: u32) -> Self {
        Self {
            symbol: symbol.into(),
            year,
            week,
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-W{:02}", self.symbol, self.year, self.week)
    }
}
