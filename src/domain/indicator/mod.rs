//! Technical indicator implementations.
//!
//! Every indicator maps a close-price series onto an [`IndicatorSeries`] of the
//! same length. Positions that cannot be computed (warm-up, missing samples)
//! hold `None`. On input, any non-finite price is treated as a missing sample.
//!
//! - `IndicatorType`: indicator identity + parameters (usable as a HashMap key)
//! - `IndicatorSeries`: aligned optional values; serializes `None` as `null`

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{BollingerBands, calculate_bollinger};
pub use ema::calculate_ema;
pub use macd::{Macd, calculate_macd, calculate_macd_default};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::error::StockscopeError;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdSignal(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn new(indicator_type: IndicatorType, values: Vec<Option<f64>>) -> Self {
        Self {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    /// Value at the most recent index, `None` if that index is undefined.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    /// Most recent defined value, searching backwards.
    pub fn last_defined(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|v| *v)
    }
}

impl Serialize for IndicatorSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.values)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdSignal(period) => write!(f, "MACD_SIGNAL({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Finite prices are samples; everything else is missing.
pub(crate) fn sample(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Reject zero-length windows before any computation.
pub(crate) fn check_period(name: &str, period: usize) -> Result<(), StockscopeError> {
    if period == 0 {
        return Err(StockscopeError::invalid_parameter(
            name,
            "window must be strictly positive",
        ));
    }
    Ok(())
}

/// Arithmetic mean of a window, `None` if any sample is missing.
pub(crate) fn window_mean(window: &[f64]) -> Option<f64> {
    if window.is_empty() || !window.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(window.iter().sum::<f64>() / window.len() as f64)
}
