//! CSV reader for one symbol's daily series.
//!
//! Expected columns: `Date, Open, High, Low, Close, Adjusted Close, Volume`.
//! Header names are matched case-insensitively after trimming; order is free
//! and extra columns are ignored. Cells that are empty or not numeric become
//! nulls instead of failing the file. Volume is read as a float like the
//! prices, so fractional or negative volumes are kept and summed.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::domain::RawRecord;

/// Errors that make a whole series file unusable.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("I/O error reading series: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("malformed CSV: {0}")]
    Malformed(String),
}

impl SeriesError {
    /// I/O failures are fatal for the batch; everything else only affects
    /// the series being read.
    pub fn is_io(&self) -> bool {
        matches!(self, SeriesError::Io(_))
    }
}

impl From<csv::Error> for SeriesError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            match e.into_kind() {
                csv::ErrorKind::Io(io) => SeriesError::Io(io),
                other => SeriesError::Malformed(format!("{other:?}")),
            }
        } else {
            SeriesError::Malformed(e.to_string())
        }
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adjusted_close: usize,
    volume: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, SeriesError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(SeriesError::MissingColumn(name))
        };
        Ok(Self {
            date: find("Date")?,
            open: find("Open")?,
            high: find("High")?,
            low: find("Low")?,
            close: find("Close")?,
            adjusted_close: find("Adjusted Close")?,
            volume: find("Volume")?,
        })
    }
}

/// Read every row of a series into raw records tagged with `symbol`.
pub fn read_series<R: Read>(reader: R, symbol: &str) -> Result<Vec<RawRecord>, SeriesError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = Columns::resolve(rdr.headers()?)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        records.push(RawRecord {
            symbol: symbol.to_string(),
            date: cell(columns.date).to_string(),
            open: parse_number(cell(columns.open)),
            high: parse_number(cell(columns.high)),
            low: parse_number(cell(columns.low)),
            close: parse_number(cell(columns.close)),
            adjusted_close: parse_number(cell(columns.adjusted_close)),
            volume: parse_number(cell(columns.volume)),
        });
    }
    Ok(records)
}

/// Symbol name for a series file: the file name with its extension stripped.
pub fn symbol_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Empty and non-numeric cells are nulls. `NaN` and `inf` parse as values
/// and are left for the completeness gate to reject.
fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Date,Low,Open,Volume,High,Close,Adjusted Close
06-01-2020,73.19,73.44,118387200,74.98,74.94,73.06
07-01-2020,74.37,74.96,108872000,75.22,74.59,72.72
";

    #[test]
    fn reads_rows_regardless_of_column_order() {
        let recs = read_series(SAMPLE.as_bytes(), "AAPL").unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].symbol, "AAPL");
        assert_eq!(recs[0].date, "06-01-2020");
        assert_eq!(recs[0].open, Some(73.44));
        assert_eq!(recs[0].low, Some(73.19));
        assert_eq!(recs[0].adjusted_close, Some(73.06));
        assert_eq!(recs[1].volume, Some(108_872_000.0));
    }

    #[test]
    fn header_match_is_case_insensitive() {
        let data = "date,open,high,low,close,ADJUSTED CLOSE,volume\n06-01-2020,1,2,0.5,1.5,1.4,10\n";
        let recs = read_series(data.as_bytes(), "X").unwrap();
        assert_eq!(recs[0].close, Some(1.5));
    }

    #[test]
    fn missing_column_fails_the_file() {
        let data = "Date,Open,High,Low,Close,Volume\n06-01-2020,1,2,0.5,1.5,10\n";
        let err = read_series(data.as_bytes(), "X").unwrap_err();
        assert!(matches!(err, SeriesError::MissingColumn("Adjusted Close")));
        assert!(!err.is_io());
    }

    #[test]
    fn empty_and_garbage_cells_become_nulls() {
        let data = "Date,Open,High,Low,Close,Adjusted Close,Volume\n06-01-2020,,n/a,0.5,1.5,1.4,\n";
        let recs = read_series(data.as_bytes(), "X").unwrap();
        assert_eq!(recs[0].open, None);
        assert_eq!(recs[0].high, None);
        assert_eq!(recs[0].low, Some(0.5));
        assert_eq!(recs[0].volume, None);
    }

    #[test]
    fn nan_and_infinite_cells_are_kept_as_values() {
        let data = "Date,Open,High,Low,Close,Adjusted Close,Volume\n06-01-2020,1,inf,0.5,NaN,1.4,10\n";
        let recs = read_series(data.as_bytes(), "X").unwrap();
        assert!(recs[0].close.unwrap().is_nan());
        assert_eq!(recs[0].high, Some(f64::INFINITY));
    }

    #[test]
    fn short_row_yields_nulls_for_missing_cells() {
        let data = "Date,Open,High,Low,Close,Adjusted Close,Volume\n06-01-2020,1,2\n";
        let recs = read_series(data.as_bytes(), "X").unwrap();
        assert_eq!(recs[0].high, Some(2.0));
        assert_eq!(recs[0].low, None);
        assert_eq!(recs[0].volume, None);
    }

    #[test]
    fn fractional_and_negative_volumes_are_kept() {
        assert_eq!(parse_number("1500.5"), Some(1500.5));
        assert_eq!(parse_number("1.5e3"), Some(1500.0));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn symbol_is_file_stem() {
        assert_eq!(
            symbol_from_path(Path::new("data/nasdaq/AAPL.csv")),
            Some("AAPL".to_string())
        );
        assert_eq!(
            symbol_from_path(Path::new("BRK.B.csv")),
            Some("BRK.B".to_string())
        );
    }
}
