//! Series merge orchestrator: runs the pipeline over a market and merges
//! accepted symbols into one consolidated dataset.
//!
//! Symbols are independent, so they run on the rayon pool when parallelism
//! is enabled. Results are collected and folded into the dataset on the
//! calling thread in listing order; that fold is the only point where
//! symbols meet.

use rayon::prelude::*;
use thiserror::Error;

use marketquake_core::data::{SeriesResource, SeriesSource};
use marketquake_core::domain::ConsolidatedDataset;

use crate::config::ExecutionConfig;
use crate::pipeline::{process_resource, PipelineContext, PipelineError, SymbolReport, SymbolResult};
use crate::progress::BatchProgress;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Result of one market batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub market: String,
    pub dataset: ConsolidatedDataset,
    /// One entry per listed symbol, in listing order.
    pub symbols: Vec<SymbolReport>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.symbols.iter().filter(|s| s.is_accepted()).count()
    }

    pub fn disregarded(&self) -> usize {
        self.symbols.len() - self.processed()
    }

    pub fn total(&self) -> usize {
        self.symbols.len()
    }
}

/// Runs every series of a market through the pipeline and merges the
/// accepted ones.
pub struct SeriesMergeOrchestrator<'a> {
    source: &'a dyn SeriesSource,
    ctx: PipelineContext,
    execution: ExecutionConfig,
    progress: &'a dyn BatchProgress,
}

impl<'a> SeriesMergeOrchestrator<'a> {
    pub fn new(
        source: &'a dyn SeriesSource,
        ctx: PipelineContext,
        progress: &'a dyn BatchProgress,
    ) -> Self {
        Self {
            source,
            ctx,
            execution: ExecutionConfig::default(),
            progress,
        }
    }

    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// Process one market.
    ///
    /// Zero accepted symbols is a valid outcome and yields an empty dataset.
    pub fn run(&self, market: &str) -> Result<BatchReport, MergeError> {
        let resources = self.source.list(market).map_err(PipelineError::from)?;
        let total = resources.len();
        tracing::info!(market, total, source = self.source.name(), "starting batch");
        self.progress.on_listed(market, total);

        let results = self.process_all(&resources)?;

        let mut report = BatchReport {
            market: market.to_string(),
            ..BatchReport::default()
        };
        for result in results {
            if result.report.is_accepted() {
                report.dataset.append(result.rows);
            }
            report.symbols.push(result.report);
        }

        let (processed, disregarded) = (report.processed(), report.disregarded());
        tracing::info!(
            market,
            processed,
            disregarded,
            rows = report.dataset.len(),
            "batch complete"
        );
        self.progress.on_batch_complete(processed, disregarded, total);
        Ok(report)
    }

    fn process_all(&self, resources: &[SeriesResource]) -> Result<Vec<SymbolResult>, MergeError> {
        if !self.execution.parallel {
            return resources
                .iter()
                .map(|r| self.process_one(r))
                .collect::<Result<Vec<_>, _>>()
                .map_err(MergeError::from);
        }

        let run = || {
            resources
                .par_iter()
                .map(|r| self.process_one(r))
                .collect::<Result<Vec<_>, _>>()
        };

        let results = match self.execution.threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| MergeError::ThreadPool(e.to_string()))?
                .install(run),
            None => run(),
        };
        results.map_err(MergeError::from)
    }

    fn process_one(&self, resource: &SeriesResource) -> Result<SymbolResult, PipelineError> {
        let result = process_resource(&self.ctx, self.source, resource)?;
        self.progress.on_symbol(&result.report);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use marketquake_core::data::SourceError;
    use std::collections::BTreeMap;
    use std::io::Read;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory source: market → (symbol → CSV text).
    struct MemorySource {
        markets: BTreeMap<String, BTreeMap<String, String>>,
    }

    impl MemorySource {
        fn new(market: &str, files: Vec<(&str, String)>) -> Self {
            let files = files
                .into_iter()
                .map(|(s, c)| (s.to_string(), c))
                .collect();
            let mut markets = BTreeMap::new();
            markets.insert(market.to_string(), files);
            Self { markets }
        }
    }

    impl SeriesSource for MemorySource {
        fn name(&self) -> &str {
            "memory"
        }

        fn list(&self, market: &str) -> Result<Vec<SeriesResource>, SourceError> {
            let files = self.markets.get(market).ok_or_else(|| SourceError::MarketNotFound {
                market: market.to_string(),
                path: PathBuf::from(market),
            })?;
            Ok(files
                .keys()
                .map(|symbol| SeriesResource {
                    symbol: symbol.clone(),
                    location: format!("mem://{market}/{symbol}.csv"),
                    path: PathBuf::from(format!("{market}/{symbol}.csv")),
                })
                .collect())
        }

        fn open(&self, resource: &SeriesResource) -> Result<Box<dyn Read + Send>, SourceError> {
            let market = resource.path.parent().and_then(|p| p.to_str()).unwrap_or("");
            let content = self.markets[market][&resource.symbol].clone();
            Ok(Box::new(std::io::Cursor::new(content.into_bytes())))
        }
    }

    /// Records every callback, for ordering and count checks.
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl BatchProgress for RecordingProgress {
        fn on_listed(&self, market: &str, total: usize) {
            self.events.lock().unwrap().push(format!("listed {market} {total}"));
        }
        fn on_symbol(&self, report: &SymbolReport) {
            self.events
                .lock()
                .unwrap()
                .push(format!("symbol {} {}", report.symbol, report.is_accepted()));
        }
        fn on_batch_complete(&self, processed: usize, disregarded: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {processed} {disregarded} {total}"));
        }
    }

    const HEADER: &str = "Date,Open,High,Low,Close,Adjusted Close,Volume\n";

    fn csv(rows: &[&str]) -> String {
        let mut s = HEADER.to_string();
        for r in rows {
            s.push_str(r);
            s.push('\n');
        }
        s
    }

    fn market() -> MemorySource {
        MemorySource::new(
            "nasdaq",
            vec![
                (
                    "AAPL",
                    csv(&[
                        "06-01-2020,10,11,9,10,10,100",
                        "07-01-2020,11,12,10,11,11,200",
                    ]),
                ),
                // every Volume cell empty in its only week → rejected
                ("BAD", csv(&["06-01-2020,10,11,9,10,10,"])),
                ("JUNK", "Ticker,Price\nX,1\n".to_string()),
                (
                    "MSFT",
                    csv(&["not-a-date,1,1,1,1,1,1", "13-01-2020,20,21,19,20,20,300"]),
                ),
            ],
        )
    }

    #[test]
    fn bad_symbols_are_skipped_without_aborting() {
        let source = market();
        for parallel in [false, true] {
            let orchestrator = SeriesMergeOrchestrator::new(
                &source,
                PipelineContext::default(),
                &SilentProgress,
            )
            .with_execution(ExecutionConfig {
                parallel,
                threads: Some(2),
            });
            let report = orchestrator.run("nasdaq").unwrap();

            assert_eq!(report.total(), 4);
            assert_eq!(report.processed(), 2);
            assert_eq!(report.disregarded(), 2);
            assert_eq!(report.dataset.symbols(), vec!["AAPL", "MSFT"]);
            assert_eq!(report.dataset.len(), 2);

            let listed: Vec<&str> = report.symbols.iter().map(|s| s.symbol.as_str()).collect();
            assert_eq!(listed, vec!["AAPL", "BAD", "JUNK", "MSFT"]);
        }
    }

    #[test]
    fn every_symbol_reports_exactly_once() {
        let source = market();
        let progress = RecordingProgress::default();
        SeriesMergeOrchestrator::new(&source, PipelineContext::default(), &progress)
            .run("nasdaq")
            .unwrap();

        let events = progress.events.lock().unwrap();
        assert_eq!(events.first().unwrap(), "listed nasdaq 4");
        assert_eq!(events.last().unwrap(), "done 2 2 4");
        assert_eq!(events.iter().filter(|e| e.starts_with("symbol ")).count(), 4);
    }

    #[test]
    fn all_rejected_gives_empty_dataset() {
        let source = MemorySource::new("nyse", vec![("BAD", csv(&["06-01-2020,,,,,,"]))]);
        let report = SeriesMergeOrchestrator::new(&source, PipelineContext::default(), &SilentProgress)
            .run("nyse")
            .unwrap();
        assert_eq!(report.processed(), 0);
        assert!(report.dataset.is_empty());
    }

    #[test]
    fn unknown_market_is_fatal() {
        let source = market();
        let err = SeriesMergeOrchestrator::new(&source, PipelineContext::default(), &SilentProgress)
            .run("forbes2000")
            .unwrap_err();
        assert!(matches!(err, MergeError::Pipeline(PipelineError::Source(_))));
    }

    #[test]
    fn repeated_runs_produce_identical_datasets() {
        let source = market();
        let orchestrator =
            SeriesMergeOrchestrator::new(&source, PipelineContext::default(), &SilentProgress);
        let a = orchestrator.run("nasdaq").unwrap();
        let b = orchestrator.run("nasdaq").unwrap();
        assert_eq!(a.dataset, b.dataset);
    }
}
