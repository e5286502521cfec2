//! Weekly aggregate rows and the consolidated dataset they merge into.

use serde::{Deserialize, Serialize};

use super::week::WeekKey;

/// Summary statistics for one symbol in one ISO week.
///
/// `volume` is the sum of daily volumes; the price fields are arithmetic means
/// of the daily values. A field is `None` only when no day in the bucket had a
/// value for it, and NaN when some day held a NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub symbol: String,
    pub year: i32,
    pub week: u32,
    pub volume: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
}

/// Names of the nullable fields, in output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateField {
    Volume,
    Low,
    High,
    Open,
    Close,
    AdjustedClose,
}

impl AggregateField {
    pub const ALL: [AggregateField; 6] = [
        AggregateField::Volume,
        AggregateField::Low,
        AggregateField::High,
        AggregateField::Open,
        AggregateField::Close,
        AggregateField::AdjustedClose,
    ];

    /// Column header used in the consolidated file.
    pub fn column_name(self) -> &'static str {
        match self {
            AggregateField::Volume => "Volume",
            AggregateField::Low => "Low",
            AggregateField::High => "High",
            AggregateField::Open => "Open",
            AggregateField::Close => "Close",
            AggregateField::AdjustedClose => "Adjusted Close",
        }
    }

    /// Look up a field by its column header, ignoring case and surrounding
    /// whitespace.
    pub fn from_column_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.column_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for AggregateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

impl WeeklyAggregate {
    pub fn key(&self) -> WeekKey {
        WeekKey::new(self.symbol.clone(), self.year, self.week)
    }

    pub fn value(&self, field: AggregateField) -> Option<f64> {
        match field {
            AggregateField::Volume => self.volume,
            AggregateField::Low => self.low,
            AggregateField::High => self.high,
            AggregateField::Open => self.open,
            AggregateField::Close => self.close,
            AggregateField::AdjustedClose => self.adjusted_close,
        }
    }

    /// First field (in column order) that is null or not finite, if any.
    pub fn first_null_field(&self) -> Option<AggregateField> {
        AggregateField::ALL
            .into_iter()
            .find(|field| !self.value(*field).is_some_and(f64::is_finite))
    }
}

/// All weekly rows from every accepted symbol.
///
/// Rows of one symbol are contiguous and ordered by `(year, week)`. Order
/// across symbols follows the order in which symbols were merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedDataset {
    rows: Vec<WeeklyAggregate>,
}

impl ConsolidatedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one accepted symbol's rows.
    pub fn append(&mut self, rows: Vec<WeeklyAggregate>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[WeeklyAggregate] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<WeeklyAggregate> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct symbols in merge order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if out.last() != Some(&row.symbol.as_str()) {
                out.push(row.symbol.as_str());
            }
        }
        out
    }
}

impl From<Vec<WeeklyAggregate>> for ConsolidatedDataset {
    fn from(rows: Vec<WeeklyAggregate>) -> Self {
        Self { rows }
    }
}
