//! MarketQuake Core: daily series ingestion, ISO-week aggregation, completeness gate.
//!
//! This crate contains the algorithmic heart of the cleansing pipeline:
//! - Domain types (raw and normalized daily records, week keys, weekly aggregates)
//! - Series sources and the CSV series reader
//! - Date normalization and the inclusive analysis window
//! - ISO-8601 week bucketing
//! - Map-then-reduce weekly aggregation
//! - Null-based completeness validation and a coverage diagnostic

pub mod aggregate;
pub mod data;
pub mod domain;
