//! CLI definition and dispatch.

use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{
    CsvAdapter, read_fundamentals, read_lots, sample_fundamentals,
};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analysis::IndicatorParams;
use crate::domain::config_validation::{
    indicator_params, lookback_days, scoring_thresholds, validate_config,
};
use crate::domain::error::StockscopeError;
use crate::domain::filter_parser::parse_filter;
use crate::domain::fundamental::{FundamentalAsset, ScoredAsset, ScoringThresholds};
use crate::domain::portfolio::Portfolio;
use crate::domain::position::{Lot, normalize_ticker};
use crate::domain::screener::{ScreenerFilter, screen_and_score};
use crate::domain::universe::{BatchAnalysis, analyse_universe, parse_tickers};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "stockscope", about = "Technical and fundamental stock analysis")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators, signals and the composite score per ticker
    Analyse {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated tickers; defaults to every CSV in the data directory
        #[arg(short, long)]
        tickers: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Last date of the analysis window (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Filter and score fundamentals
    Screen {
        /// Fundamentals CSV; defaults to the bundled sample universe
        #[arg(short, long)]
        fundamentals: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Filter expression such as "roe >= 25" or "sector in Technology, Energy"
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// JSON array of {field, operator, value} filters
        #[arg(long)]
        filters_json: Option<PathBuf>,
    },
    /// Aggregate purchase lots into positions
    Portfolio {
        #[arg(short, long)]
        lots: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Candle directory used to price positions at their last close
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Last date considered for quotes (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Latest quote as TICKER=PRICE; may be repeated and wins over history
        #[arg(long = "price", value_parser = parse_quote)]
        prices: Vec<(String, f64)>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyse {
            config,
            tickers,
            data_dir,
            end,
        } => run_analyse(
            config.as_deref(),
            tickers.as_deref(),
            data_dir.as_deref(),
            end,
        ),
        Command::Screen {
            fundamentals,
            config,
            filters,
            filters_json,
        } => run_screen(
            fundamentals.as_deref(),
            config.as_deref(),
            &filters,
            filters_json.as_deref(),
        ),
        Command::Portfolio {
            lots,
            config,
            data_dir,
            end,
            prices,
        } => run_portfolio(&lots, config.as_deref(), data_dir.as_deref(), end, &prices),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, StockscopeError> {
    match path {
        Some(path) => FileConfigAdapter::from_file(path),
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// Render JSON output; `[output] pretty = false` selects the compact form.
pub fn render_json<T: Serialize>(
    value: &T,
    config: &dyn ConfigPort,
) -> Result<String, StockscopeError> {
    let rendered = if config.get_bool("output", "pretty", true) {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}

fn print_json<T: Serialize>(value: &T, config: &dyn ConfigPort) -> Result<(), StockscopeError> {
    println!("{}", render_json(value, config)?);
    Ok(())
}

fn data_dir_from(config: &dyn ConfigPort, data_dir: Option<&Path>) -> Option<PathBuf> {
    data_dir
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("data", "dir").map(PathBuf::from))
}

/// Parse `TICKER=PRICE`.
pub fn parse_quote(input: &str) -> Result<(String, f64), String> {
    let (ticker, price) = input
        .split_once('=')
        .ok_or_else(|| format!("expected TICKER=PRICE, got '{input}'"))?;
    let ticker = normalize_ticker(ticker);
    if ticker.is_empty() {
        return Err("ticker must not be empty".to_string());
    }
    let price: f64 = price
        .trim()
        .parse()
        .map_err(|_| format!("invalid price in '{input}'"))?;
    if !price.is_finite() || price < 0.0 {
        return Err(format!("price must be a finite non-negative number in '{input}'"));
    }
    Ok((ticker, price))
}

/// `[end - lookback_days, end]`.
pub fn analysis_window(end: NaiveDate, lookback_days: usize) -> (NaiveDate, NaiveDate) {
    let start = end
        .checked_sub_days(Days::new(lookback_days as u64))
        .unwrap_or(NaiveDate::MIN);
    (start, end)
}

fn run_analyse(
    config_path: Option<&Path>,
    tickers: Option<&str>,
    data_dir: Option<&Path>,
    end: Option<NaiveDate>,
) -> Result<(), StockscopeError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let data_dir =
        data_dir_from(&config, data_dir).ok_or_else(|| StockscopeError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })?;
    let adapter = CsvAdapter::new(data_dir);
    let end = end.unwrap_or_else(|| Local::now().date_naive());

    let batch = run_analyse_pipeline(
        &adapter,
        tickers,
        end,
        lookback_days(&config)?,
        &indicator_params(&config)?,
    )?;
    print_json(&batch, &config)
}

/// Resolve the ticker list and analyse every ticker over the lookback window.
pub fn run_analyse_pipeline(
    data_port: &dyn DataPort,
    tickers: Option<&str>,
    end: NaiveDate,
    lookback_days: usize,
    params: &IndicatorParams,
) -> Result<BatchAnalysis, StockscopeError> {
    let tickers = match tickers {
        Some(list) => parse_tickers(list).map_err(|e| StockscopeError::InvalidParameter {
            name: "tickers".into(),
            reason: e.to_string(),
        })?,
        None => data_port.list_tickers()?,
    };
    if tickers.is_empty() {
        return Err(StockscopeError::Data {
            reason: "no tickers to analyse".into(),
        });
    }

    let (start, end) = analysis_window(end, lookback_days);
    tracing::info!(tickers = tickers.len(), %start, %end, "running analysis");
    let batch = analyse_universe(data_port, &tickers, start, end, params)?;
    tracing::info!(
        analysed = batch.reports.len(),
        skipped = batch.skipped.len(),
        "analysis complete"
    );
    Ok(batch)
}

fn run_screen(
    fundamentals: Option<&Path>,
    config_path: Option<&Path>,
    filter_exprs: &[String],
    filters_json: Option<&Path>,
) -> Result<(), StockscopeError> {
    let config = load_config(config_path)?;
    let thresholds = scoring_thresholds(&config)?;

    let mut filters = Vec::new();
    if let Some(path) = filters_json {
        let content = fs::read_to_string(path)?;
        let parsed: Vec<ScreenerFilter> = serde_json::from_str(&content)?;
        filters.extend(parsed);
    }
    filters.extend(parse_filter_exprs(filter_exprs)?);

    let assets = match fundamentals {
        Some(path) => read_fundamentals(path)?,
        None => sample_fundamentals()?,
    };
    let ranked = run_screen_pipeline(assets, &filters, &thresholds);
    print_json(&ranked, &config)
}

/// Parse each expression, printing the failing one with a caret on error.
pub fn parse_filter_exprs(exprs: &[String]) -> Result<Vec<ScreenerFilter>, StockscopeError> {
    exprs
        .iter()
        .map(|expr| {
            parse_filter(expr).map_err(|e| {
                eprintln!("{}", e.display_with_context(expr));
                StockscopeError::from(e)
            })
        })
        .collect()
}

pub fn run_screen_pipeline(
    assets: Vec<FundamentalAsset>,
    filters: &[ScreenerFilter],
    thresholds: &ScoringThresholds,
) -> Vec<ScoredAsset> {
    let total = assets.len();
    let ranked = screen_and_score(assets, filters, thresholds);
    tracing::info!(
        total,
        filters = filters.len(),
        matched = ranked.len(),
        "screened fundamentals"
    );
    ranked
}

fn run_portfolio(
    lots_path: &Path,
    config_path: Option<&Path>,
    data_dir: Option<&Path>,
    end: Option<NaiveDate>,
    prices: &[(String, f64)],
) -> Result<(), StockscopeError> {
    let config = load_config(config_path)?;
    let lots = read_lots(lots_path)?;
    let adapter = data_dir_from(&config, data_dir).map(CsvAdapter::new);
    let window = analysis_window(
        end.unwrap_or_else(|| Local::now().date_naive()),
        lookback_days(&config)?,
    );

    let portfolio = run_portfolio_pipeline(
        &lots,
        adapter.as_ref().map(|a| a as &dyn DataPort),
        window,
        prices,
    );
    print_json(&portfolio, &config)
}

/// Aggregate lots, then price positions from the last close in the window and
/// finally from manual quotes. Positions without either keep their lot price.
pub fn run_portfolio_pipeline(
    lots: &[Lot],
    data_port: Option<&dyn DataPort>,
    (start, end): (NaiveDate, NaiveDate),
    prices: &[(String, f64)],
) -> Portfolio {
    let mut portfolio = Portfolio::from_lots(lots);
    if let Some(port) = data_port {
        let tickers: Vec<String> = portfolio
            .positions()
            .iter()
            .map(|p| p.ticker.clone())
            .collect();
        portfolio = portfolio.reprice(&last_close_quotes(port, &tickers, start, end));
    }
    let manual: HashMap<String, f64> = prices.iter().cloned().collect();
    let portfolio = portfolio.reprice(&manual);
    tracing::info!(
        positions = portfolio.len(),
        quoted = manual.len(),
        "aggregated lots"
    );
    portfolio
}

/// Last finite close per ticker. Tickers with no usable history are left out.
pub fn last_close_quotes(
    data_port: &dyn DataPort,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> HashMap<String, f64> {
    let mut quotes = HashMap::new();
    for ticker in tickers {
        match data_port.fetch_candles(ticker, start, end) {
            Ok(candles) => {
                match candles.iter().rev().map(|c| c.close).find(|c| c.is_finite()) {
                    Some(close) => {
                        quotes.insert(ticker.clone(), close);
                    }
                    None => tracing::warn!(%ticker, "no close in window, keeping lot price"),
                }
            }
            Err(e) => tracing::warn!(%ticker, error = %e, "no price history, keeping lot price"),
        }
    }
    quotes
}

fn run_validate(config_path: &Path) -> Result<(), StockscopeError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    validate_config(&config)?;
    println!("{}: ok", config_path.display());
    Ok(())
}
