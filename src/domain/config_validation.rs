//! Configuration validation and typed parameter loading.
//!
//! Every value is checked before any analysis runs. Absent keys take their
//! defaults; present but malformed keys are errors.

use crate::domain::analysis::IndicatorParams;
use crate::domain::error::StockscopeError;
use crate::domain::fundamental::{Band, ScoringThresholds, SweetSpot};
use crate::domain::signal::RsiThresholds;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LOOKBACK_DAYS: usize = 180;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StockscopeError> {
    indicator_params(config)?;
    scoring_thresholds(config)?;
    lookback_days(config)?;
    Ok(())
}

pub fn indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, StockscopeError> {
    let defaults = IndicatorParams::default();
    let section = "indicators";

    let macd_fast = read_window(config, section, "macd_fast", defaults.macd_fast)?;
    let macd_slow = read_window(config, section, "macd_slow", defaults.macd_slow)?;
    if macd_fast >= macd_slow {
        return Err(invalid(section, "macd_fast", "macd_fast must be below macd_slow"));
    }

    let bollinger_k = read_number(config, section, "bollinger_k", defaults.bollinger_k)?;
    if bollinger_k < 0.0 {
        return Err(invalid(section, "bollinger_k", "bollinger_k must be non-negative"));
    }

    let overbought = read_number(
        config,
        section,
        "rsi_overbought",
        defaults.rsi_thresholds.overbought,
    )?;
    let oversold = read_number(
        config,
        section,
        "rsi_oversold",
        defaults.rsi_thresholds.oversold,
    )?;
    if !(0.0..=100.0).contains(&overbought) || !(0.0..=100.0).contains(&oversold) {
        return Err(invalid(section, "rsi_overbought", "rsi thresholds must lie in [0, 100]"));
    }
    let rsi_thresholds = RsiThresholds::new(overbought, oversold).map_err(|_| {
        invalid(section, "rsi_oversold", "rsi_oversold must be below rsi_overbought")
    })?;

    Ok(IndicatorParams {
        sma_short: read_window(config, section, "sma_short", defaults.sma_short)?,
        sma_long: read_window(config, section, "sma_long", defaults.sma_long)?,
        ema: read_window(config, section, "ema", defaults.ema)?,
        rsi: read_window(config, section, "rsi", defaults.rsi)?,
        macd_fast,
        macd_slow,
        macd_signal: read_window(config, section, "macd_signal", defaults.macd_signal)?,
        bollinger_period: read_window(
            config,
            section,
            "bollinger_period",
            defaults.bollinger_period,
        )?,
        bollinger_k,
        rsi_thresholds,
    })
}

pub fn scoring_thresholds(config: &dyn ConfigPort) -> Result<ScoringThresholds, StockscopeError> {
    let defaults = ScoringThresholds::default();
    let section = "scoring";

    let spot = defaults.dividend_yield;
    let dividend_yield = SweetSpot {
        ideal_min: read_number(config, section, "dividend_ideal_min", spot.ideal_min)?,
        ideal_max: read_number(config, section, "dividend_ideal_max", spot.ideal_max)?,
        tolerance_min: read_number(config, section, "dividend_tolerance_min", spot.tolerance_min)?,
        tolerance_max: read_number(config, section, "dividend_tolerance_max", spot.tolerance_max)?,
    };
    if !(dividend_yield.tolerance_min <= dividend_yield.ideal_min
        && dividend_yield.ideal_min <= dividend_yield.ideal_max
        && dividend_yield.ideal_max <= dividend_yield.tolerance_max)
    {
        return Err(invalid(
            section,
            "dividend_ideal_min",
            "expected tolerance_min <= ideal_min <= ideal_max <= tolerance_max",
        ));
    }

    Ok(ScoringThresholds {
        pe: read_band(config, section, "pe", defaults.pe, Direction::LowerIsBetter)?,
        pb: read_band(config, section, "pb", defaults.pb, Direction::LowerIsBetter)?,
        roe: read_band(config, section, "roe", defaults.roe, Direction::HigherIsBetter)?,
        roic: read_band(config, section, "roic", defaults.roic, Direction::HigherIsBetter)?,
        net_debt_to_equity: read_band(
            config,
            section,
            "net_debt_to_equity",
            defaults.net_debt_to_equity,
            Direction::LowerIsBetter,
        )?,
        dividend_yield,
    })
}

pub fn lookback_days(config: &dyn ConfigPort) -> Result<usize, StockscopeError> {
    read_window(config, "data", "lookback_days", DEFAULT_LOOKBACK_DAYS)
}

#[derive(Clone, Copy)]
enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

fn read_band(
    config: &dyn ConfigPort,
    section: &str,
    metric: &str,
    default: Band,
    direction: Direction,
) -> Result<Band, StockscopeError> {
    let best_key = format!("{metric}_best");
    let band = Band {
        best: read_number(config, section, &best_key, default.best)?,
        worst: read_number(config, section, &format!("{metric}_worst"), default.worst)?,
    };
    match direction {
        Direction::LowerIsBetter if band.best >= band.worst => Err(invalid(
            section,
            &best_key,
            &format!("{metric}_best must be below {metric}_worst"),
        )),
        Direction::HigherIsBetter if band.best <= band.worst => Err(invalid(
            section,
            &best_key,
            &format!("{metric}_best must be above {metric}_worst"),
        )),
        _ => Ok(band),
    }
}

fn read_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, StockscopeError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, &format!("{key} must be an integer")))?;
    if value <= 0 {
        return Err(invalid(section, key, &format!("{key} must be positive")));
    }
    Ok(value as usize)
}

fn read_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, StockscopeError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid(section, key, &format!("{key} must be a finite number"))),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> StockscopeError {
    StockscopeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            MapConfig(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }

        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn assert_invalid_key(err: StockscopeError, expected: &str) {
        match err {
            StockscopeError::ConfigInvalid { key, .. } => assert_eq!(key, expected),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = MapConfig::new(&[]);
        assert_eq!(indicator_params(&config).unwrap(), IndicatorParams::default());
        assert_eq!(scoring_thresholds(&config).unwrap(), ScoringThresholds::default());
        assert_eq!(lookback_days(&config).unwrap(), 180);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn reads_overrides() {
        let config = MapConfig::new(&[
            ("indicators", "sma_short", "5"),
            ("indicators", "sma_long", "20"),
            ("indicators", "bollinger_k", "2.5"),
            ("scoring", "pe_best", "8"),
            ("data", "lookback_days", "90"),
        ]);
        let params = indicator_params(&config).unwrap();
        assert_eq!(params.sma_short, 5);
        assert_eq!(params.sma_long, 20);
        assert_eq!(params.bollinger_k, 2.5);
        assert_eq!(scoring_thresholds(&config).unwrap().pe.best, 8.0);
        assert_eq!(lookback_days(&config).unwrap(), 90);
    }

    #[test]
    fn rejects_zero_window() {
        let config = MapConfig::new(&[("indicators", "rsi", "0")]);
        assert_invalid_key(indicator_params(&config).unwrap_err(), "rsi");
    }

    #[test]
    fn rejects_non_numeric_window() {
        let config = MapConfig::new(&[("indicators", "ema", "twenty")]);
        assert_invalid_key(indicator_params(&config).unwrap_err(), "ema");
    }

    #[test]
    fn rejects_inverted_macd() {
        let config = MapConfig::new(&[
            ("indicators", "macd_fast", "26"),
            ("indicators", "macd_slow", "12"),
        ]);
        assert_invalid_key(indicator_params(&config).unwrap_err(), "macd_fast");
    }

    #[test]
    fn rejects_negative_bollinger_multiplier() {
        let config = MapConfig::new(&[("indicators", "bollinger_k", "-1")]);
        assert_invalid_key(indicator_params(&config).unwrap_err(), "bollinger_k");
    }

    #[test]
    fn rejects_inverted_rsi_thresholds() {
        let config = MapConfig::new(&[
            ("indicators", "rsi_overbought", "30"),
            ("indicators", "rsi_oversold", "70"),
        ]);
        assert_invalid_key(indicator_params(&config).unwrap_err(), "rsi_oversold");

        let config = MapConfig::new(&[("indicators", "rsi_overbought", "120")]);
        assert_invalid_key(indicator_params(&config).unwrap_err(), "rsi_overbought");
    }

    #[test]
    fn rejects_degenerate_band() {
        let config = MapConfig::new(&[("scoring", "roe_best", "5"), ("scoring", "roe_worst", "5")]);
        assert_invalid_key(scoring_thresholds(&config).unwrap_err(), "roe_best");
    }

    #[test]
    fn rejects_band_running_the_wrong_way() {
        let config = MapConfig::new(&[("scoring", "pe_best", "50")]);
        assert_invalid_key(scoring_thresholds(&config).unwrap_err(), "pe_best");

        let config = MapConfig::new(&[("scoring", "roic_best", "1")]);
        assert_invalid_key(scoring_thresholds(&config).unwrap_err(), "roic_best");
    }

    #[test]
    fn rejects_unordered_sweet_spot() {
        let config = MapConfig::new(&[("scoring", "dividend_ideal_min", "8")]);
        assert_invalid_key(scoring_thresholds(&config).unwrap_err(), "dividend_ideal_min");
    }

    #[test]
    fn rejects_non_finite_number() {
        let config = MapConfig::new(&[("scoring", "pb_worst", "inf")]);
        assert_invalid_key(scoring_thresholds(&config).unwrap_err(), "pb_worst");
    }

    #[test]
    fn validate_reports_lookback() {
        let config = MapConfig::new(&[("data", "lookback_days", "-3")]);
        assert_invalid_key(validate_config(&config).unwrap_err(), "lookback_days");
    }
}
