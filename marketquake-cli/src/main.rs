//! MarketQuake CLI: cleanse stock market folders and prepare analyses.
//!
//! Commands:
//! - `cleanse <market>` aggregates one market folder into weekly rows
//! - `cleanse --all` runs every known market in turn
//! - `analyse ...` validates an analysis request and loads its datasets

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use marketquake_core::data::LocalSeriesSource;
use marketquake_runner::{
    cleanse_market, load_inputs, save_batch_report, AnalysisRequest, CleanseConfig, CsvFileSink,
    StdoutProgress, KNOWN_MARKETS,
};

#[derive(Parser)]
#[command(
    name = "marketquake",
    about = "Weekly stock market cleansing for COVID-era analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a market's daily CSVs into one weekly dataset.
    Cleanse {
        /// Market folder under the data root (e.g., nasdaq).
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        market: Option<String>,

        /// Cleanse sp500, forbes2000, nyse and nasdaq in turn.
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root holding one folder per market.
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Directory for the consolidated `{market}.csv` files.
        #[arg(long)]
        output_root: Option<PathBuf>,

        /// Process symbols one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Worker threads for parallel processing.
        #[arg(long)]
        threads: Option<usize>,

        /// Also write a `{market}_report.json` batch report into this directory.
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// Validate an analysis request and load the consolidated datasets it needs.
    Analyse {
        /// Weekly column to analyse (Volume, Low, High, Open, Close, Adjusted Close).
        stock_column: String,

        /// Market name, or `all`.
        market: String,

        /// COVID metric column.
        covid_column: String,

        /// COVID area level (e.g., country).
        area_level: String,

        /// COVID area name (e.g., US).
        area_name: String,

        /// Company sector.
        sector: String,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding the consolidated `{market}.csv` files.
        #[arg(long)]
        output_root: Option<PathBuf>,
    },
}

#[allow(clippy::expect_used)]
fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["marketquake=info", "marketquake_core=info", "marketquake_runner=info"] {
        filter = filter.add_directive(directive.parse().expect("static directive is valid"));
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Cleanse {
            market,
            all,
            config,
            data_root,
            output_root,
            sequential,
            threads,
            report_dir,
        } => {
            let mut cfg = load_config(config)?;
            if let Some(root) = data_root {
                cfg.data_root = root;
            }
            if let Some(root) = output_root {
                cfg.output_root = root;
            }
            if sequential {
                cfg.execution.parallel = false;
            }
            if threads.is_some() {
                cfg.execution.threads = threads;
            }
            cfg.validate()?;

            let markets: Vec<String> = match market {
                Some(m) => vec![m],
                None if all => KNOWN_MARKETS.iter().map(|m| m.to_string()).collect(),
                None => bail!("either <MARKET> or --all is required"),
            };
            run_cleanse(&cfg, &markets, report_dir.as_deref())
        }
        Commands::Analyse {
            stock_column,
            market,
            covid_column,
            area_level,
            area_name,
            sector,
            config,
            output_root,
        } => {
            let request = AnalysisRequest::new(
                &stock_column,
                &market,
                &covid_column,
                &area_level,
                &area_name,
                &sector,
            )?;
            let mut cfg = load_config(config)?;
            if let Some(root) = output_root {
                cfg.output_root = root;
            }
            run_analyse(&request, &cfg)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<CleanseConfig> {
    match path {
        Some(p) => {
            tracing::debug!(path = %p.display(), "loading config");
            CleanseConfig::from_file(&p)
                .with_context(|| format!("failed to load config {}", p.display()))
        }
        None => Ok(CleanseConfig::default()),
    }
}

fn run_cleanse(cfg: &CleanseConfig, markets: &[String], report_dir: Option<&Path>) -> Result<()> {
    let source = LocalSeriesSource::new(&cfg.data_root);
    let sink = CsvFileSink::new(&cfg.output_root);

    for market in markets {
        let outcome = cleanse_market(cfg, market, &source, &sink, &StdoutProgress)
            .with_context(|| format!("cleansing '{market}' failed"))?;

        let report = &outcome.report;
        let (read, dropped, outside) = report.symbols.iter().fold((0, 0, 0), |acc, s| {
            (
                acc.0 + s.rows_read,
                acc.1 + s.parse_failures,
                acc.2 + s.outside_window,
            )
        });
        println!("  Rows read:       {read}");
        println!("  Bad dates:       {dropped}");
        println!("  Outside window:  {outside}");
        println!("  Weekly rows:     {}", report.dataset.len());
        println!("  Output:          {}", outcome.output.display());

        if let Some(dir) = report_dir {
            let path = save_batch_report(report, dir)?;
            println!("  Report:          {}", path.display());
        }
    }
    Ok(())
}

fn run_analyse(request: &AnalysisRequest, cfg: &CleanseConfig) -> Result<()> {
    println!("Received arguments:");
    for (name, value) in request.describe() {
        println!("  {name}: {value}");
    }
    println!();

    let inputs = load_inputs(request, &cfg.output_root)?;
    for input in &inputs {
        let summary = input.summarize(request.stock_column);
        println!("{} ({})", input.market, input.path.display());
        println!("  Symbols:  {}", summary.symbols);
        println!("  Rows:     {}", summary.rows);
        match summary.span {
            Some(((y0, w0), (y1, w1))) => {
                println!("  Weeks:    {y0}-W{w0:02} .. {y1}-W{w1:02}")
            }
            None => println!("  Weeks:    none"),
        }
        match summary.mean {
            Some(mean) => println!("  Mean {}: {mean:.4}", request.stock_column),
            None => println!("  Mean {}: n/a", request.stock_column),
        }
    }
    Ok(())
}
