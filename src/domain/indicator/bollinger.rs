//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) values are undefined on all three bands.

use serde::Serialize;

use crate::domain::error::StockscopeError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, calculate_sma, check_period};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

pub fn calculate_bollinger(
    series: &[f64],
    period: usize,
    multiplier: f64,
) -> Result<BollingerBands, StockscopeError> {
    check_period("bollinger period", period)?;
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(StockscopeError::invalid_parameter(
            "bollinger multiplier",
            format!("must be finite and non-negative, got {}", multiplier),
        ));
    }

    let middle = calculate_sma(series, period)?;
    let mut upper = Vec::with_capacity(series.len());
    let mut lower = Vec::with_capacity(series.len());

    for (i, mean) in middle.values.iter().enumerate() {
        let Some(mean) = *mean else {
            upper.push(None);
            lower.push(None);
            continue;
        };

        let window = &series[i + 1 - period..=i];
        let variance = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        let deviation = multiplier * variance.sqrt();

        upper.push(Some(mean + deviation));
        lower.push(Some(mean - deviation));
    }

    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100: (multiplier * 100.0).round() as u32,
    };

    Ok(BollingerBands {
        upper: IndicatorSeries::new(indicator_type.clone(), upper),
        middle: IndicatorSeries::new(indicator_type.clone(), middle.values),
        lower: IndicatorSeries::new(indicator_type, lower),
    })
}
