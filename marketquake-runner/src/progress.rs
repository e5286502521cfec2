//! Progress reporting for batch cleansing.
//!
//! Every symbol gets exactly one outcome line. Callbacks may arrive from
//! worker threads and out of listing order when symbols run in parallel.

use crate::pipeline::{SymbolOutcome, SymbolReport};

/// Progress callback for multi-symbol runs.
pub trait BatchProgress: Send + Sync {
    /// Called once the market listing is known.
    fn on_listed(&self, market: &str, total: usize);

    /// Called when one symbol reaches a terminal state.
    fn on_symbol(&self, report: &SymbolReport);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, processed: usize, disregarded: usize, total: usize);
}

/// Prints one line per symbol to stdout.
pub struct StdoutProgress;

impl BatchProgress for StdoutProgress {
    fn on_listed(&self, market: &str, total: usize) {
        println!("Cleansing {market}: {total} file(s)");
    }

    fn on_symbol(&self, report: &SymbolReport) {
        match report.outcome() {
            SymbolOutcome::Processed => println!("File {} processed.", report.location),
            SymbolOutcome::Disregarded(reason) => {
                println!("File {} disregarded due to {reason}.", report.location)
            }
        }
    }

    fn on_batch_complete(&self, processed: usize, disregarded: usize, total: usize) {
        println!("\nCleansing complete: {processed}/{total} processed, {disregarded} disregarded");
    }
}

/// Discards all progress. Used by tests and library callers that only want
/// the returned report.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn on_listed(&self, _market: &str, _total: usize) {}

    fn on_symbol(&self, _report: &SymbolReport) {}

    fn on_batch_complete(&self, _processed: usize, _disregarded: usize, _total: usize) {}
}
