//! MarketQuake Runner: cleansing orchestration on top of `marketquake-core`.
//!
//! This crate provides:
//! - TOML configuration with validation
//! - The per-symbol pipeline and its state machine
//! - The series merge orchestrator (parallel via rayon)
//! - Consolidated CSV export and the dataset sink
//! - Validation and loading for the analysis entry point

pub mod analysis;
pub mod config;
pub mod export;
pub mod merge;
pub mod pipeline;
pub mod progress;

use std::path::PathBuf;

use thiserror::Error;

use marketquake_core::data::SeriesSource;

pub use analysis::{load_inputs, AnalysisRequest, ColumnSummary, CovidArea, MarketInput, MarketSelector};
pub use config::{validate_market, CleanseConfig, ConfigError, ExecutionConfig, KNOWN_MARKETS};
pub use export::{
    export_batch_report_json, export_consolidated_csv, read_consolidated, save_batch_report,
    write_consolidated, CsvFileSink, DatasetSink, CONSOLIDATED_HEADER,
};
pub use merge::{BatchReport, MergeError, SeriesMergeOrchestrator};
pub use pipeline::{
    process_resource, process_series, DisregardReason, PipelineContext, PipelineError,
    SymbolOutcome, SymbolReport, SymbolResult, SymbolStage,
};
pub use progress::{BatchProgress, SilentProgress, StdoutProgress};

/// Anything that stops a market from being cleansed.
#[derive(Debug, Error)]
pub enum CleanseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("write consolidated dataset for '{market}': {message}")]
    Output { market: String, message: String },
}

/// A finished market: the batch report and where the dataset was written.
#[derive(Debug, Clone)]
pub struct CleanseOutcome {
    pub report: BatchReport,
    pub output: PathBuf,
}

/// Cleanse one market end to end.
///
/// The dataset is written even when every symbol was disregarded.
pub fn cleanse_market(
    config: &CleanseConfig,
    market: &str,
    source: &dyn SeriesSource,
    sink: &dyn DatasetSink,
    progress: &dyn BatchProgress,
) -> Result<CleanseOutcome, CleanseError> {
    config.validate()?;
    let market = validate_market(market)?;

    let report = SeriesMergeOrchestrator::new(source, PipelineContext::from_config(config), progress)
        .with_execution(config.execution)
        .run(market)?;

    let output = sink
        .write(market, &report.dataset)
        .map_err(|e| CleanseError::Output {
            market: market.to_string(),
            message: format!("{e:#}"),
        })?;

    Ok(CleanseOutcome { report, output })
}
