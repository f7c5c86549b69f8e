//! Indicator snapshot and per-ticker analysis report.

use serde::Serialize;

use crate::domain::composite::{CompositeScore, composite_score};
use crate::domain::error::StockscopeError;
use crate::domain::indicator::{
    BollingerBands, IndicatorSeries, Macd, bollinger, calculate_bollinger, calculate_ema,
    calculate_macd, calculate_rsi, calculate_sma, macd, rsi,
};
use crate::domain::ohlcv::{Candle, closes};
use crate::domain::position::normalize_ticker;
use crate::domain::signal::{RsiThresholds, TechnicalSignals, moving_average_cross, rsi_signal};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    pub rsi_thresholds: RsiThresholds,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            ema: 20,
            rsi: rsi::DEFAULT_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_k: bollinger::DEFAULT_MULTIPLIER,
            rsi_thresholds: RsiThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSnapshot {
    pub closes: Vec<f64>,
    pub sma_short: IndicatorSeries,
    pub sma_long: IndicatorSeries,
    pub ema: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub macd: Macd,
    pub bollinger: BollingerBands,
    pub signals: TechnicalSignals,
}

pub fn build_snapshot(
    candles: &[Candle],
    params: &IndicatorParams,
) -> Result<TechnicalSnapshot, StockscopeError> {
    let closes = closes(candles);

    let sma_short = calculate_sma(&closes, params.sma_short)?;
    let sma_long = calculate_sma(&closes, params.sma_long)?;
    let ema = calculate_ema(&closes, params.ema)?;
    let rsi = calculate_rsi(&closes, params.rsi)?;
    let macd = calculate_macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal)?;
    let bollinger = calculate_bollinger(&closes, params.bollinger_period, params.bollinger_k)?;

    let signals = TechnicalSignals {
        rsi_signal: rsi_signal(&rsi, params.rsi_thresholds),
        moving_average_cross: moving_average_cross(&sma_short, &sma_long),
    };

    Ok(TechnicalSnapshot {
        closes,
        sma_short,
        sma_long,
        ema,
        rsi,
        macd,
        bollinger,
        signals,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub ticker: String,
    pub last_close: Option<f64>,
    pub score: CompositeScore,
    pub snapshot: TechnicalSnapshot,
}

/// Build the snapshot and score it with the trend-momentum composite.
pub fn analyse(
    ticker: &str,
    candles: &[Candle],
    params: &IndicatorParams,
) -> Result<AnalysisReport, StockscopeError> {
    let snapshot = build_snapshot(candles, params)?;
    let score = composite_score(
        &snapshot.closes,
        &snapshot.sma_short,
        &snapshot.sma_long,
        &snapshot.rsi,
    );
    let last_close = snapshot.closes.iter().rev().copied().find(|c| c.is_finite());

    Ok(AnalysisReport {
        ticker: normalize_ticker(ticker),
        last_close,
        score,
        snapshot,
    })
}
