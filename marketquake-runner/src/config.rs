//! Cleansing configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//! CLI flags override individual values after loading.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use marketquake_core::aggregate::WeekYearBasis;
use marketquake_core::data::{parse_date, AnalysisWindow, InvalidWindow, DEFAULT_DATE_FORMAT};

/// Markets the cleansing job knows about, in processing order for `--all`.
pub const KNOWN_MARKETS: [&str; 4] = ["sp500", "forbes2000", "nyse", "nasdaq"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("required parameter '{0}' is missing or empty")]
    EmptyParameter(&'static str),

    #[error("invalid market name '{0}': must be a single path component")]
    InvalidMarket(String),

    #[error(transparent)]
    InvalidWindow(#[from] InvalidWindow),

    #[error("date format '{0}' cannot round-trip a calendar date")]
    InvalidDateFormat(String),

    #[error("thread count must be at least 1")]
    ZeroThreads,

    #[error("unknown stock column '{column}'; expected one of: {expected}")]
    UnknownColumn { column: String, expected: String },
}

/// How symbols are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Process symbols concurrently on the rayon pool.
    pub parallel: bool,
    /// Size of a dedicated pool; `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Serializable configuration for one cleansing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanseConfig {
    /// Root holding one directory of CSV files per market.
    pub data_root: PathBuf,

    /// Directory the consolidated `{market}.csv` files are written to.
    pub output_root: PathBuf,

    /// Inclusive date range kept before aggregation.
    pub window: AnalysisWindow,

    /// `strftime` format of the `Date` column.
    pub date_format: String,

    /// Year paired with the ISO week number.
    pub week_year_basis: WeekYearBasis,

    pub execution: ExecutionConfig,
}

impl Default for CleanseConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/stock_market_data"),
            output_root: PathBuf::from("data/stock_market_data_clean"),
            window: AnalysisWindow::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            week_year_basis: WeekYearBasis::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl CleanseConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyParameter("data_root"));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyParameter("output_root"));
        }
        AnalysisWindow::new(self.window.start, self.window.end)?;
        validate_date_format(&self.date_format)?;
        if self.execution.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

/// Reject empty names and anything that would escape the data root.
pub fn validate_market(market: &str) -> Result<&str, ConfigError> {
    let trimmed = market.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyParameter("market"));
    }
    if trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(ConfigError::InvalidMarket(market.to_string()));
    }
    Ok(trimmed)
}

/// A format is usable if it has no bad specifiers and a formatted date
/// parses back to itself.
fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    if format.trim().is_empty() {
        return Err(ConfigError::EmptyParameter("date_format"));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidDateFormat(format.to_string()));
    }
    let probe = NaiveDate::from_ymd_opt(2021, 11, 23)
        .ok_or_else(|| ConfigError::InvalidDateFormat(format.to_string()))?;
    let rendered = probe.format(format).to_string();
    match parse_date(&rendered, format) {
        Ok(parsed) if parsed == probe => Ok(()),
        _ => Err(ConfigError::InvalidDateFormat(format.to_string())),
    }
}
