//! Per-symbol pipeline: read → normalize → bucket → aggregate → validate.
//!
//! Each symbol moves through `Pending → Normalized → Bucketed → Aggregated`
//! and ends in `Accepted` or `Rejected`. Both terminal states are final; a
//! symbol is never retried. Problems local to one series (unparseable dates,
//! nulls, a malformed file) end that symbol only. Storage failures are
//! returned as errors and abort the batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use marketquake_core::aggregate::{
    coverage, validate, CoverageReport, RejectReason, ValidationOutcome, WeeklyAggregator,
};
use marketquake_core::data::{
    normalize_series, read_series, AnalysisWindow, SeriesError, SeriesResource, SeriesSource,
    SourceError, DEFAULT_DATE_FORMAT,
};
use marketquake_core::domain::{RawRecord, WeeklyAggregate};

use crate::config::CleanseConfig;

/// Where a symbol is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolStage {
    Pending,
    Normalized,
    Bucketed,
    Aggregated,
    Accepted,
    Rejected,
}

impl SymbolStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, SymbolStage::Accepted | SymbolStage::Rejected)
    }
}

/// Why a symbol was left out of the consolidated dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum DisregardReason {
    #[error("{0}")]
    MissingData(RejectReason),

    #[error("malformed series: {0}")]
    MalformedSeries(String),
}

/// User-facing verdict for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolOutcome<'a> {
    Processed,
    Disregarded(&'a DisregardReason),
}

/// Errors that abort the whole batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("read {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: SeriesError,
    },
}

/// Everything a stage needs, passed explicitly instead of living in a
/// process-wide session.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub window: AnalysisWindow,
    pub date_format: String,
    pub aggregator: WeeklyAggregator,
}

impl PipelineContext {
    pub fn from_config(config: &CleanseConfig) -> Self {
        Self {
            window: config.window,
            date_format: config.date_format.clone(),
            aggregator: WeeklyAggregator::new(config.week_year_basis),
        }
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self {
            window: AnalysisWindow::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            aggregator: WeeklyAggregator::default(),
        }
    }
}

/// What happened to one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub location: String,
    pub rows_read: usize,
    pub parse_failures: usize,
    pub outside_window: usize,
    /// Weekly rows produced (before the gate).
    pub weeks: usize,
    /// Week coverage of the window; informational only.
    pub coverage: Option<CoverageReport>,
    /// Terminal stage.
    pub stage: SymbolStage,
    pub disregarded: Option<DisregardReason>,
}

impl SymbolReport {
    fn pending(symbol: &str, location: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            location: location.to_string(),
            rows_read: 0,
            parse_failures: 0,
            outside_window: 0,
            weeks: 0,
            coverage: None,
            stage: SymbolStage::Pending,
            disregarded: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.stage == SymbolStage::Accepted
    }

    pub fn outcome(&self) -> SymbolOutcome<'_> {
        match &self.disregarded {
            Some(reason) => SymbolOutcome::Disregarded(reason),
            None => SymbolOutcome::Processed,
        }
    }

    fn advance(&mut self, next: SymbolStage) {
        tracing::trace!(symbol = %self.symbol, from = ?self.stage, to = ?next, "stage");
        self.stage = next;
    }

    fn reject(mut self, reason: DisregardReason) -> SymbolResult {
        tracing::warn!(symbol = %self.symbol, %reason, "symbol disregarded");
        self.advance(SymbolStage::Rejected);
        self.disregarded = Some(reason);
        SymbolResult {
            report: self,
            rows: Vec::new(),
        }
    }
}

/// Report plus the accepted rows (empty when rejected).
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolResult {
    pub report: SymbolReport,
    pub rows: Vec<WeeklyAggregate>,
}

/// Run the pure stages over records already read for one symbol.
pub fn process_series(
    ctx: &PipelineContext,
    symbol: &str,
    location: &str,
    raw: Vec<RawRecord>,
) -> SymbolResult {
    let mut report = SymbolReport::pending(symbol, location);
    report.rows_read = raw.len();

    let normalized = normalize_series(raw, &ctx.date_format, &ctx.window);
    report.parse_failures = normalized.parse_failures.len();
    report.outside_window = normalized.outside_window;
    if let Some(first) = normalized.parse_failures.first() {
        tracing::debug!(
            symbol,
            count = report.parse_failures,
            first = %first,
            "dropped records with unparseable dates"
        );
    }
    report.advance(SymbolStage::Normalized);

    let buckets = ctx.aggregator.bucket(&normalized.records);
    report.advance(SymbolStage::Bucketed);

    let rows = buckets.finish();
    report.weeks = rows.len();
    let cov = coverage(&rows, &ctx.window, ctx.aggregator.basis());
    tracing::debug!(
        symbol,
        present = cov.present_weeks,
        expected = cov.expected_weeks,
        "week coverage"
    );
    report.coverage = Some(cov);
    report.advance(SymbolStage::Aggregated);

    match validate(rows) {
        ValidationOutcome::Accepted(rows) => {
            report.advance(SymbolStage::Accepted);
            SymbolResult { report, rows }
        }
        ValidationOutcome::Rejected(reason) => {
            report.reject(DisregardReason::MissingData(reason))
        }
    }
}

/// Read one resource from its source and run it through the pipeline.
pub fn process_resource(
    ctx: &PipelineContext,
    source: &dyn SeriesSource,
    resource: &SeriesResource,
) -> Result<SymbolResult, PipelineError> {
    let reader = source.open(resource)?;
    match read_series(reader, &resource.symbol) {
        Ok(raw) => Ok(process_series(ctx, &resource.symbol, &resource.location, raw)),
        Err(e) if e.is_io() => Err(PipelineError::Read {
            location: resource.location.clone(),
            source: e,
        }),
        Err(e) => Ok(SymbolReport::pending(&resource.symbol, &resource.location)
            .reject(DisregardReason::MalformedSeries(e.to_string()))),
    }
}
