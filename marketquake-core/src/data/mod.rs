//! Data ingestion: series sources, CSV reading, date normalization

pub mod normalize;
pub mod series;
pub mod source;

pub use normalize::{
    normalize, normalize_series, parse_date, AnalysisWindow, InvalidWindow, NormalizedSeries,
    ParseFailure, DEFAULT_DATE_FORMAT,
};
pub use series::{read_series, symbol_from_path, SeriesError};
pub use source::{LocalSeriesSource, SeriesResource, SeriesSource, SourceError};
