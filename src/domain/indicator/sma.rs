//! Simple Moving Average indicator.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) values are undefined, as is
//! any window containing a missing sample.

use crate::domain::error::StockscopeError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, check_period, window_mean};

pub fn calculate_sma(series: &[f64], period: usize) -> Result<IndicatorSeries, StockscopeError> {
    check_period("sma period", period)?;

    let values = (0..series.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                window_mean(&series[i + 1 - period..=i])
            }
        })
        .collect();

    Ok(IndicatorSeries::new(IndicatorType::Sma(period), values))
}
