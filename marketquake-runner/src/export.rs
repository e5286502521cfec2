//! Consolidated dataset export: CSV rendering, atomic file output, and the
//! reader used by the analysis entry point. Batch reports export as JSON.
//!
//! Nulls are written as empty cells. Prices use Rust's shortest round-trip
//! float formatting, so a file read back yields the same values.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use marketquake_core::domain::{ConsolidatedDataset, WeeklyAggregate};

use crate::merge::BatchReport;
use crate::pipeline::SymbolReport;

/// Column order of the consolidated file.
pub const CONSOLIDATED_HEADER: [&str; 9] = [
    "Name",
    "Year",
    "Week",
    "Volume",
    "Low",
    "High",
    "Open",
    "Close",
    "Adjusted Close",
];

/// Where consolidated datasets go.
pub trait DatasetSink: Send + Sync {
    /// Persist one market's dataset and return where it ended up.
    fn write(&self, market: &str, dataset: &ConsolidatedDataset) -> Result<PathBuf>;
}

/// Writes `{output_root}/{market}.csv`.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    output_root: PathBuf,
}

impl CsvFileSink {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn path_for(&self, market: &str) -> PathBuf {
        self.output_root.join(format!("{market}.csv"))
    }
}

impl DatasetSink for CsvFileSink {
    fn write(&self, market: &str, dataset: &ConsolidatedDataset) -> Result<PathBuf> {
        let path = self.path_for(market);
        write_consolidated(dataset, &path)?;
        Ok(path)
    }
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render a dataset as CSV. The header is written even when there are no rows.
pub fn export_consolidated_csv(dataset: &ConsolidatedDataset) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CONSOLIDATED_HEADER)?;

    for r in dataset.rows() {
        wtr.write_record([
            r.symbol.clone(),
            r.year.to_string(),
            r.week.to_string(),
            opt(r.volume),
            opt(r.low),
            opt(r.high),
            opt(r.open),
            opt(r.close),
            opt(r.adjusted_close),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write a dataset to `path`, replacing any previous file.
///
/// Writes go to `{path}.tmp` first and are renamed into place, so readers
/// never see a half-written dataset.
pub fn write_consolidated(dataset: &ConsolidatedDataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output dir: {}", parent.display()))?;
    }

    let csv = export_consolidated_csv(dataset)?;
    let tmp_path = path.with_extension("csv.tmp");
    fs::write(&tmp_path, csv)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| format!("atomic rename to {} failed", path.display()));
    }

    tracing::info!(path = %path.display(), rows = dataset.len(), "wrote consolidated dataset");
    Ok(())
}

// ─── CSV import ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ConsolidatedRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Week")]
    week: u32,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Adjusted Close")]
    adjusted_close: Option<f64>,
}

impl From<ConsolidatedRow> for WeeklyAggregate {
    fn from(r: ConsolidatedRow) -> Self {
        WeeklyAggregate {
            symbol: r.name,
            year: r.year,
            week: r.week,
            volume: r.volume,
            low: r.low,
            high: r.high,
            open: r.open,
            close: r.close,
            adjusted_close: r.adjusted_close,
        }
    }
}

/// Load a consolidated file written by [`write_consolidated`].
pub fn read_consolidated(path: &Path) -> Result<ConsolidatedDataset> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    if headers.iter().ne(CONSOLIDATED_HEADER) {
        bail!(
            "{} is not a consolidated dataset (header: {})",
            path.display(),
            headers.iter().collect::<Vec<_>>().join(",")
        );
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.deserialize::<ConsolidatedRow>().enumerate() {
        let row = record.with_context(|| format!("{}: bad row {}", path.display(), i + 1))?;
        rows.push(WeeklyAggregate::from(row));
    }
    Ok(ConsolidatedDataset::from(rows))
}

// ─── Batch report ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct BatchSummary<'a> {
    market: &'a str,
    processed: usize,
    disregarded: usize,
    total: usize,
    rows: usize,
    symbols: &'a [SymbolReport],
}

/// Serialize a batch report (counts and per-symbol reports, without the
/// rows themselves) to pretty JSON.
pub fn export_batch_report_json(report: &BatchReport) -> Result<String> {
    let summary = BatchSummary {
        market: &report.market,
        processed: report.processed(),
        disregarded: report.disregarded(),
        total: report.total(),
        rows: report.dataset.len(),
        symbols: &report.symbols,
    };
    serde_json::to_string_pretty(&summary).context("failed to serialize batch report to JSON")
}

/// Write `{dir}/{market}_report.json` and return its path.
pub fn save_batch_report(report: &BatchReport, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report dir: {}", dir.display()))?;
    let path = dir.join(format!("{}_report.json", report.market));
    let json = export_batch_report_json(report)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
