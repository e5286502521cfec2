//! Weekly bucketing, aggregation and the completeness gate

pub mod bucket;
pub mod coverage;
pub mod validate;
pub mod weekly;

pub use bucket::{week_key, week_of, WeekYearBasis};
pub use coverage::{coverage, expected_weeks, CoverageReport};
pub use validate::{validate, RejectReason, ValidationOutcome};
pub use weekly::{WeekBuckets, WeeklyAggregator};
