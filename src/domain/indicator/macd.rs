//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! The signal EMA is seeded with the same "first complete window" rule as any
//! other EMA, applied to the MACD line, so for a gap-free series it first
//! appears at index (slow - 1) + (signal - 1) when fast <= slow.

use serde::Serialize;

use crate::domain::error::StockscopeError;
use crate::domain::indicator::ema::ema_of;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, check_period, sample};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Macd {
    #[serde(rename = "macd")]
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(
    series: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<Macd, StockscopeError> {
    check_period("macd fast period", fast)?;
    check_period("macd slow period", slow)?;
    check_period("macd signal period", signal_period)?;

    let samples: Vec<Option<f64>> = series.iter().map(|&v| sample(v)).collect();
    let ema_fast = ema_of(&samples, fast);
    let ema_slow = ema_of(&samples, slow);

    let line = difference(&ema_fast, &ema_slow);
    let signal = ema_of(&line, signal_period);
    let histogram = difference(&line, &signal);

    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    Ok(Macd {
        line: IndicatorSeries::new(indicator_type.clone(), line),
        signal: IndicatorSeries::new(IndicatorType::MacdSignal(signal_period), signal),
        histogram: IndicatorSeries::new(indicator_type, histogram),
    })
}

pub fn calculate_macd_default(series: &[f64]) -> Result<Macd, StockscopeError> {
    calculate_macd(series, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

fn difference(left: &[Option<f64>], right: &[Option<f64>]) -> Vec<Option<f64>> {
    left.iter()
        .zip(right)
        .map(|(l, r)| match (l, r) {
            (Some(l), Some(r)) => Some(l - r),
            _ => None,
        })
        .collect()
}
