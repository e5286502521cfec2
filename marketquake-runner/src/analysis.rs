//! Analysis entry point: argument validation and loading of the consolidated
//! datasets that the downstream analysis consumes.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use marketquake_core::domain::{AggregateField, ConsolidatedDataset};

use crate::config::{validate_market, ConfigError, KNOWN_MARKETS};
use crate::export::read_consolidated;

/// Which consolidated datasets an analysis reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketSelector {
    /// Every known market, analysed together.
    All,
    One(String),
}

impl MarketSelector {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let market = validate_market(raw)?;
        if market.eq_ignore_ascii_case("all") {
            Ok(MarketSelector::All)
        } else {
            Ok(MarketSelector::One(market.to_string()))
        }
    }

    pub fn markets(&self) -> Vec<&str> {
        match self {
            MarketSelector::All => KNOWN_MARKETS.to_vec(),
            MarketSelector::One(m) => vec![m.as_str()],
        }
    }
}

impl fmt::Display for MarketSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketSelector::All => f.write_str("all"),
            MarketSelector::One(m) => f.write_str(m),
        }
    }
}

/// Geographic scope of the COVID series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CovidArea {
    pub level: String,
    pub name: String,
}

/// A validated analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub stock_column: AggregateField,
    pub market: MarketSelector,
    pub covid_column: String,
    pub covid_area: CovidArea,
    pub sector: String,
}

fn required(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyParameter(name));
    }
    Ok(trimmed.to_string())
}

impl AnalysisRequest {
    /// Validate raw arguments. Fails on the first empty one, before any
    /// dataset is touched.
    pub fn new(
        stock_column: &str,
        market: &str,
        covid_column: &str,
        area_level: &str,
        area_name: &str,
        sector: &str,
    ) -> Result<Self, ConfigError> {
        let stock = required("stock_column", stock_column)?;
        let market = MarketSelector::parse(market)?;
        let covid_column = required("covid_column", covid_column)?;
        let level = required("covid_area_level", area_level)?;
        let name = required("covid_area_name", area_name)?;
        let sector = required("sector", sector)?;

        let stock_column =
            AggregateField::from_column_name(&stock).ok_or_else(|| ConfigError::UnknownColumn {
                column: stock,
                expected: AggregateField::ALL
                    .iter()
                    .map(|f| f.column_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        Ok(Self {
            stock_column,
            market,
            covid_column,
            covid_area: CovidArea { level, name },
            sector,
        })
    }

    /// Echo of the request, one `name: value` line per argument.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("stock_column", self.stock_column.to_string()),
            ("market", self.market.to_string()),
            ("covid_column", self.covid_column.clone()),
            (
                "covid_area",
                format!("({}, {})", self.covid_area.level, self.covid_area.name),
            ),
            ("sector", self.sector.clone()),
        ]
    }
}

/// One market's consolidated dataset, ready for analysis.
#[derive(Debug, Clone)]
pub struct MarketInput {
    pub market: String,
    pub path: PathBuf,
    pub dataset: ConsolidatedDataset,
}

/// Shape of the selected column in one market.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub rows: usize,
    pub symbols: usize,
    /// Earliest and latest `(year, week)` present.
    pub span: Option<((i32, u32), (i32, u32))>,
    pub mean: Option<f64>,
}

impl MarketInput {
    pub fn summarize(&self, field: AggregateField) -> ColumnSummary {
        let rows = self.dataset.rows();
        let span = rows
            .iter()
            .map(|r| (r.year, r.week))
            .fold(None, |acc: Option<((i32, u32), (i32, u32))>, w| match acc {
                None => Some((w, w)),
                Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
            });

        let (sum, count) = rows
            .iter()
            .filter_map(|r| r.value(field))
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));

        ColumnSummary {
            rows: rows.len(),
            symbols: self.dataset.symbols().len(),
            span,
            mean: (count > 0).then(|| sum / count as f64),
        }
    }
}

/// Load the consolidated dataset of every selected market from
/// `{output_root}/{market}.csv`.
pub fn load_inputs(request: &AnalysisRequest, output_root: &Path) -> Result<Vec<MarketInput>> {
    request
        .market
        .markets()
        .into_iter()
        .map(|market| {
            let path = output_root.join(format!("{market}.csv"));
            let dataset = read_consolidated(&path).with_context(|| {
                format!("no consolidated dataset for '{market}'; run `cleanse {market}` first")
            })?;
            tracing::debug!(market, rows = dataset.len(), "loaded consolidated dataset");
            Ok(MarketInput {
                market: market.to_string(),
                path,
                dataset,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::write_consolidated;
    use marketquake_core::domain::WeeklyAggregate;

    fn request(stock: &str, market: &str) -> Result<AnalysisRequest, ConfigError> {
        AnalysisRequest::new(stock, market, "new_cases", "country", "US", "Technology")
    }

    #[test]
    fn valid_request_normalizes_column() {
        let req = request("adjusted close", "nasdaq").unwrap();
        assert_eq!(req.stock_column, AggregateField::AdjustedClose);
        assert_eq!(req.market, MarketSelector::One("nasdaq".into()));
        assert_eq!(req.covid_area.level, "country");
    }

    #[test]
    fn all_expands_to_known_markets() {
        let req = request("Close", "all").unwrap();
        assert_eq!(req.market.markets(), vec!["sp500", "forbes2000", "nyse", "nasdaq"]);
    }

    #[test]
    fn empty_argument_is_rejected() {
        assert!(matches!(
            AnalysisRequest::new("Close", "nyse", "", "country", "US", "Tech"),
            Err(ConfigError::EmptyParameter("covid_column"))
        ));
        assert!(matches!(
            AnalysisRequest::new("Close", " ", "cases", "country", "US", "Tech"),
            Err(ConfigError::EmptyParameter("market"))
        ));
        assert!(matches!(
            AnalysisRequest::new("Close", "nyse", "cases", "country", "US", "  "),
            Err(ConfigError::EmptyParameter("sector"))
        ));
    }

    #[test]
    fn unknown_stock_column_is_rejected() {
        let err = request("Date", "nyse").unwrap_err();
        match err {
            ConfigError::UnknownColumn { column, expected } => {
                assert_eq!(column, "Date");
                assert!(expected.contains("Adjusted Close"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn describe_lists_every_argument() {
        let req = request("Volume", "all").unwrap();
        let lines = req.describe();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], ("covid_area", "(country, US)".to_string()));
    }

    fn row(symbol: &str, year: i32, week: u32, close: Option<f64>) -> WeeklyAggregate {
        WeeklyAggregate {
            symbol: symbol.into(),
            year,
            week,
            volume: Some(100.0),
            low: Some(1.0),
            high: Some(2.0),
            open: Some(1.5),
            close,
            adjusted_close: Some(1.5),
        }
    }

    #[test]
    fn load_inputs_reads_selected_markets() {
        let dir = tempfile::tempdir().unwrap();
        let ds = ConsolidatedDataset::from(vec![
            row("AAPL", 2020, 2, Some(10.0)),
            row("AAPL", 2021, 5, Some(20.0)),
            row("MSFT", 2020, 9, None),
        ]);
        write_consolidated(&ds, &dir.path().join("nasdaq.csv")).unwrap();

        let req = request("Close", "nasdaq").unwrap();
        let inputs = load_inputs(&req, dir.path()).unwrap();
        assert_eq!(inputs.len(), 1);

        let summary = inputs[0].summarize(req.stock_column);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.symbols, 2);
        assert_eq!(summary.span, Some(((2020, 2), (2021, 5))));
        assert_eq!(summary.mean, Some(15.0));
    }

    #[test]
    fn load_inputs_fails_when_a_market_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_consolidated(&ConsolidatedDataset::new(), &dir.path().join("sp500.csv")).unwrap();
        let req = request("Close", "all").unwrap();
        let err = load_inputs(&req, dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("forbes2000"));
    }

    #[test]
    fn empty_dataset_summarizes_to_nothing() {
        let input = MarketInput {
            market: "nyse".into(),
            path: PathBuf::from("nyse.csv"),
            dataset: ConsolidatedDataset::new(),
        };
        let summary = input.summarize(AggregateField::Volume);
        assert_eq!(summary.rows, 0);
        assert_eq!(summary.span, None);
        assert_eq!(summary.mean, None);
    }
}
