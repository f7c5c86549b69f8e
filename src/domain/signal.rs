//! Discrete signals derived from indicator series.

use serde::Serialize;
use std::fmt;

use crate::domain::error::StockscopeError;
use crate::domain::indicator::IndicatorSeries;

pub const DEFAULT_OVERBOUGHT: f64 = 70.0;
pub const DEFAULT_OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossSignal {
    Bullish,
    Bearish,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThresholds {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        Self {
            overbought: DEFAULT_OVERBOUGHT,
            oversold: DEFAULT_OVERSOLD,
        }
    }
}

impl RsiThresholds {
    pub fn new(overbought: f64, oversold: f64) -> Result<Self, StockscopeError> {
        if !(overbought.is_finite() && oversold.is_finite()) || oversold >= overbought {
            return Err(StockscopeError::invalid_parameter(
                "rsi thresholds",
                format!("oversold ({oversold}) must be below overbought ({overbought})"),
            ));
        }
        Ok(Self {
            overbought,
            oversold,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSignals {
    pub rsi_signal: RsiSignal,
    pub moving_average_cross: CrossSignal,
}

impl fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RsiSignal::Overbought => "overbought",
            RsiSignal::Oversold => "oversold",
            RsiSignal::Neutral => "neutral",
        };
        f.write_str(label)
    }
}

impl fmt::Display for CrossSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrossSignal::Bullish => "bullish",
            CrossSignal::Bearish => "bearish",
            CrossSignal::None => "none",
        };
        f.write_str(label)
    }
}

/// Classify the most recent defined RSI value.
pub fn rsi_signal(rsi: &IndicatorSeries, thresholds: RsiThresholds) -> RsiSignal {
    match rsi.last_defined() {
        Some(last) if last >= thresholds.overbought => RsiSignal::Overbought,
        Some(last) if last <= thresholds.oversold => RsiSignal::Oversold,
        _ => RsiSignal::Neutral,
    }
}

/// Look at the most recent adjacent pair where both averages are defined on
/// both sides and report whether the short average crossed the long one there.
/// Older pairs are never consulted once a comparable pair is found.
pub fn moving_average_cross(short: &IndicatorSeries, long: &IndicatorSeries) -> CrossSignal {
    let length = short.len().min(long.len());

    for i in (1..length).rev() {
        let pair = (
            short.get(i - 1),
            long.get(i - 1),
            short.get(i),
            long.get(i),
        );
        let (Some(prev_short), Some(prev_long), Some(cur_short), Some(cur_long)) = pair else {
            continue;
        };

        if prev_short <= prev_long && cur_short > cur_long {
            return CrossSignal::Bullish;
        }
        if prev_short >= prev_long && cur_short < cur_long {
            return CrossSignal::Bearish;
        }
        break;
    }

    CrossSignal::None
}
