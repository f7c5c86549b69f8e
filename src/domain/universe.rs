//! Ticker lists and batch analysis.
//!
//! Each ticker is fetched and analysed independently; results are keyed by
//! ticker so they never depend on fetch order. A ticker that cannot be fetched
//! is skipped, never failing the whole batch.

use crate::domain::analysis::{AnalysisReport, IndicatorParams, analyse};
use crate::domain::error::StockscopeError;
use crate::domain::ohlcv::Candle;
use crate::domain::position::normalize_ticker;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let ticker = normalize_ticker(token);
        if ticker.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum SkipReason {
    NoData,
    FetchFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchAnalysis {
    pub reports: BTreeMap<String, AnalysisReport>,
    pub skipped: Vec<SkippedTicker>,
}

pub fn analyse_universe(
    data_port: &dyn DataPort,
    tickers: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    params: &IndicatorParams,
) -> Result<BatchAnalysis, StockscopeError> {
    let mut batch = BatchAnalysis::default();

    for raw in tickers {
        let ticker = normalize_ticker(raw);
        let candles = match data_port.fetch_candles(&ticker, start_date, end_date) {
            Ok(candles) => candles,
            Err(e) => {
                tracing::warn!(%ticker, error = %e, "skipping ticker");
                batch.skipped.push(SkippedTicker {
                    ticker,
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
                continue;
            }
        };

        let total = candles.len();
        let candles: Vec<Candle> = candles.into_iter().filter(Candle::is_finite).collect();
        if candles.len() < total {
            tracing::warn!(%ticker, dropped = total - candles.len(), "dropped non-finite candles");
        }
        if candles.is_empty() {
            tracing::warn!(%ticker, "skipping ticker: no usable candles");
            batch.skipped.push(SkippedTicker {
                ticker,
                reason: SkipReason::NoData,
            });
            continue;
        }

        tracing::info!(%ticker, candles = candles.len(), "analysing");
        let report = analyse(&ticker, &candles, params)?;
        let snapshot = &report.snapshot;
        tracing::debug!(
            %ticker,
            sma_short = %snapshot.sma_short.indicator_type,
            sma_long = %snapshot.sma_long.indicator_type,
            ema = %snapshot.ema.indicator_type,
            rsi = %snapshot.rsi.indicator_type,
            score = report.score.score,
            "snapshot computed"
        );
        batch.reports.insert(ticker, report);
    }

    Ok(batch)
}
