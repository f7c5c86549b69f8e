//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1). The seed is the mean of the first fully-defined run of n
//! samples, placed at the run's last index. Afterwards
//! EMA[i] = (C[i] - EMA[i-1]) * k + EMA[i-1]; a missing C[i] carries EMA[i-1]
//! forward so isolated gaps never restart the recursion.

use crate::domain::error::StockscopeError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, check_period, sample};

pub fn calculate_ema(series: &[f64], period: usize) -> Result<IndicatorSeries, StockscopeError> {
    check_period("ema period", period)?;
    let samples: Vec<Option<f64>> = series.iter().map(|&v| sample(v)).collect();
    Ok(IndicatorSeries::new(
        IndicatorType::Ema(period),
        ema_of(&samples, period),
    ))
}

/// EMA over an already-optional series. `period` must be non-zero.
pub(crate) fn ema_of(samples: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; samples.len()];
    let k = 2.0 / (period as f64 + 1.0);

    let anchor = (period.saturating_sub(1)..samples.len())
        .find(|&end| samples[end + 1 - period..=end].iter().all(Option::is_some));
    let Some(anchor) = anchor else {
        return values;
    };

    let mut ema = samples[anchor + 1 - period..=anchor]
        .iter()
        .flatten()
        .sum::<f64>()
        / period as f64;
    values[anchor] = Some(ema);

    for (slot, value) in values.iter_mut().zip(samples).skip(anchor + 1) {
        if let Some(v) = value {
            ema = (v - ema) * k + ema;
        }
        *slot = Some(ema);
    }

    values
}
