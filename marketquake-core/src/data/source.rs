//! Series sources: where per-symbol input files come from.
//!
//! The `SeriesSource` trait abstracts over storage so the pipeline can run
//! against a local directory tree or a test double. A source groups series
//! by market (e.g. `nasdaq`, `sp500`); each series is one symbol.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::series::symbol_from_path;
use crate::domain::Symbol;

/// One addressable per-symbol input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesResource {
    pub symbol: Symbol,
    /// Human-readable location, used in progress output.
    pub location: String,
    pub path: PathBuf,
}

/// Listing or opening failures. These are fatal for a batch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("market '{market}' not found at {}", path.display())]
    MarketNotFound { market: String, path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for series storage.
pub trait SeriesSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// All series in a market, in a stable order.
    fn list(&self, market: &str) -> Result<Vec<SeriesResource>, SourceError>;

    /// Open one series for reading.
    fn open(&self, resource: &SeriesResource) -> Result<Box<dyn Read + Send>, SourceError>;
}

/// Series stored as `{root}/{market}/{SYMBOL}.csv` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalSeriesSource {
    root: PathBuf,
}

impl LocalSeriesSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn market_dir(&self, market: &str) -> PathBuf {
        self.root.join(market)
    }
}

impl SeriesSource for LocalSeriesSource {
    fn name(&self) -> &str {
        "local"
    }

    fn list(&self, market: &str) -> Result<Vec<SeriesResource>, SourceError> {
        let dir = self.market_dir(market);
        if !dir.is_dir() {
            return Err(SourceError::MarketNotFound {
                market: market.to_string(),
                path: dir,
            });
        }

        let io_err = |source| SourceError::Io {
            path: dir.clone(),
            source,
        };

        let mut resources = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv || !path.is_file() {
                continue;
            }
            let Some(symbol) = symbol_from_path(&path) else {
                continue;
            };
            resources.push(SeriesResource {
                symbol,
                location: path.display().to_string(),
                path,
            });
        }

        resources.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(market, count = resources.len(), "listed series");
        Ok(resources)
    }

    fn open(&self, resource: &SeriesResource) -> Result<Box<dyn Read + Send>, SourceError> {
        let file = File::open(&resource.path).map_err(|source| SourceError::Io {
            path: resource.path.clone(),
            source,
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}
