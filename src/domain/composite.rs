//! Trend-momentum composite score.
//!
//! Starts from a neutral 50 and adjusts:
//! - ±20 for the latest short SMA above/below the latest long SMA
//! - +10 when the latest RSI is oversold (< 30), -10 when overbought (> 70)
//! - mean of the last five period returns, in percent, capped at ±15
//!
//! The result is clamped to [0, 100] and rounded. Missing inputs contribute
//! nothing, so an empty history scores exactly 50.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::domain::indicator::IndicatorSeries;
use crate::domain::signal::{DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD};

pub const BASE_SCORE: f64 = 50.0;
pub const TREND_WEIGHT: f64 = 20.0;
pub const RSI_WEIGHT: f64 = 10.0;
pub const MOMENTUM_CAP: f64 = 15.0;
pub const RETURN_LOOKBACK: usize = 5;
pub const UPTREND_THRESHOLD: u8 = 60;
pub const DOWNTREND_THRESHOLD: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLabel {
    LikelyUptrend,
    LikelyDowntrend,
    StableUncertain,
}

impl ScoreLabel {
    pub fn from_score(score: u8) -> Self {
        if score >= UPTREND_THRESHOLD {
            ScoreLabel::LikelyUptrend
        } else if score <= DOWNTREND_THRESHOLD {
            ScoreLabel::LikelyDowntrend
        } else {
            ScoreLabel::StableUncertain
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreLabel::LikelyUptrend => "Likely uptrend",
            ScoreLabel::LikelyDowntrend => "Likely downtrend",
            ScoreLabel::StableUncertain => "Stable / uncertain",
        }
    }
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScoreLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompositeScore {
    pub score: u8,
    pub label: ScoreLabel,
}

pub fn composite_score(
    closes: &[f64],
    sma_short: &IndicatorSeries,
    sma_long: &IndicatorSeries,
    rsi: &IndicatorSeries,
) -> CompositeScore {
    let mut raw = BASE_SCORE;

    if let (Some(short), Some(long)) = (sma_short.latest(), sma_long.latest()) {
        raw += if short > long { TREND_WEIGHT } else { -TREND_WEIGHT };
    }

    match rsi.latest() {
        Some(value) if value < DEFAULT_OVERSOLD => raw += RSI_WEIGHT,
        Some(value) if value > DEFAULT_OVERBOUGHT => raw -= RSI_WEIGHT,
        _ => {}
    }

    raw += (recent_mean_return(closes) * 100.0).clamp(-MOMENTUM_CAP, MOMENTUM_CAP);

    let score = raw.clamp(0.0, 100.0).round() as u8;
    CompositeScore {
        score,
        label: ScoreLabel::from_score(score),
    }
}

/// Mean of the last few finite period-over-period returns; 0 when there are none.
fn recent_mean_return(closes: &[f64]) -> f64 {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|r| r.is_finite())
        .collect();

    let recent = &returns[returns.len().saturating_sub(RETURN_LOOKBACK)..];
    if recent.is_empty() {
        return 0.0;
    }
    recent.iter().sum::<f64>() / recent.len() as f64
}
