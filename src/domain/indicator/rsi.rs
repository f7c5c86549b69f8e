//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of the first n gains/losses
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n values are undefined; a series of n or fewer prices has no
//! defined value at all. A price change touching a missing sample counts as
//! neither gain nor loss, and the RSI at a missing sample is undefined.

use crate::domain::error::StockscopeError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, check_period};

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(series: &[f64], period: usize) -> Result<IndicatorSeries, StockscopeError> {
    check_period("rsi period", period)?;

    let mut values = vec![None; series.len()];
    if series.len() <= period {
        return Ok(IndicatorSeries::new(IndicatorType::Rsi(period), values));
    }

    // changes[j] is the move from series[j] to series[j + 1]
    let changes: Vec<(f64, f64)> = series
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            if change.is_finite() {
                (change.max(0.0), (-change).max(0.0))
            } else {
                (0.0, 0.0)
            }
        })
        .collect();

    let n = period as f64;
    let mut avg_gain = changes[..period].iter().map(|c| c.0).sum::<f64>() / n;
    let mut avg_loss = changes[..period].iter().map(|c| c.1).sum::<f64>() / n;
    values[period] = series[period]
        .is_finite()
        .then(|| rsi_value(avg_gain, avg_loss));

    for i in (period + 1)..series.len() {
        let (gain, loss) = changes[i - 1];
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        values[i] = series[i].is_finite().then(|| rsi_value(avg_gain, avg_loss));
    }

    Ok(IndicatorSeries::new(IndicatorType::Rsi(period), values))
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
