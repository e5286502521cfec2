//! Domain types for the weekly cleansing pipeline

pub mod aggregate;
pub mod record;
pub mod week;

pub use aggregate::{AggregateField, ConsolidatedDataset, WeeklyAggregate};
pub use record::{NormalizedRecord, RawRecord};
pub use week::WeekKey;

/// Symbol type alias
pub type Symbol = String;
