//! Fundamental metric normalization and per-asset scoring.
//!
//! Each raw metric is mapped to 0..=100 with one of three curves
//! (lower-is-better, higher-is-better, sweet-spot). Four sub-scores are
//! averaged into the composite; non-finite metrics score 0.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalAsset {
    pub isin: String,
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub currency: String,
    #[serde(alias = "market_cap", default = "missing", deserialize_with = "lenient_number")]
    pub market_cap: f64,
    #[serde(default = "missing", deserialize_with = "lenient_number")]
    pub pe: f64,
    #[serde(default = "missing", deserialize_with = "lenient_number")]
    pub pb: f64,
    #[serde(default = "missing", deserialize_with = "lenient_number")]
    pub roe: f64,
    #[serde(default = "missing", deserialize_with = "lenient_number")]
    pub roic: f64,
    #[serde(alias = "dividend_yield", default = "missing", deserialize_with = "lenient_number")]
    pub dividend_yield: f64,
    #[serde(
        alias = "net_debt_to_equity",
        default = "missing",
        deserialize_with = "lenient_number"
    )]
    pub net_debt_to_equity: f64,
}

/// A field of an asset looked up by name, as seen by the screener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl FundamentalAsset {
    /// Look up a field by name. Accepts camelCase or snake_case, any case.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let key: String = name
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        let value = match key.as_str() {
            "isin" => FieldValue::Text(&self.isin),
            "ticker" => FieldValue::Text(&self.ticker),
            "name" => FieldValue::Text(&self.name),
            "country" => FieldValue::Text(&self.country),
            "sector" => FieldValue::Text(&self.sector),
            "currency" => FieldValue::Text(&self.currency),
            "marketcap" => FieldValue::Number(self.market_cap),
            "pe" => FieldValue::Number(self.pe),
            "pb" => FieldValue::Number(self.pb),
            "roe" => FieldValue::Number(self.roe),
            "roic" => FieldValue::Number(self.roic),
            "dividendyield" => FieldValue::Number(self.dividend_yield),
            "netdebttoequity" => FieldValue::Number(self.net_debt_to_equity),
            _ => return None,
        };
        Some(value)
    }
}

fn missing() -> f64 {
    f64::NAN
}

/// Accept numbers, numeric strings, empty strings and nulls; anything that is
/// not a number becomes NaN.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    struct LenientNumber;

    impl<'de> Visitor<'de> for LenientNumber {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number, a numeric string or null")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<f64, E> {
            Ok(f64::NAN)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            Ok(v.trim().parse().unwrap_or(f64::NAN))
        }

        fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
            Ok(f64::NAN)
        }

        fn visit_none<E: de::Error>(self) -> Result<f64, E> {
            Ok(f64::NAN)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<f64, D2::Error> {
            d.deserialize_any(LenientNumber)
        }
    }

    deserializer.deserialize_any(LenientNumber)
}

/// Best/worst anchors of a monotonic scoring curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub best: f64,
    pub worst: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweetSpot {
    pub ideal_min: f64,
    pub ideal_max: f64,
    pub tolerance_min: f64,
    pub tolerance_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringThresholds {
    pub pe: Band,
    pub pb: Band,
    pub roe: Band,
    pub roic: Band,
    pub net_debt_to_equity: Band,
    pub dividend_yield: SweetSpot,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            pe: Band { best: 10.0, worst: 40.0 },
            pb: Band { best: 1.0, worst: 5.0 },
            roe: Band { best: 25.0, worst: 5.0 },
            roic: Band { best: 20.0, worst: 2.0 },
            net_debt_to_equity: Band { best: 0.0, worst: 150.0 },
            dividend_yield: SweetSpot {
                ideal_min: 2.0,
                ideal_max: 7.0,
                tolerance_min: 0.0,
                tolerance_max: 12.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub valuation: u8,
    pub profitability: u8,
    pub financial_health: u8,
    pub dividend: u8,
}

impl ScoreBreakdown {
    /// Unweighted mean of the four sub-scores, rounded.
    pub fn composite(&self) -> u8 {
        let total = self.valuation as f64
            + self.profitability as f64
            + self.financial_health as f64
            + self.dividend as f64;
        (total / 4.0).round() as u8
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredAsset {
    #[serde(flatten)]
    pub asset: FundamentalAsset,
    pub score: u8,
    pub breakdown: ScoreBreakdown,
}

fn to_score(ratio: f64) -> u8 {
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

pub fn lower_is_better(value: f64, best: f64, worst: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    if value <= best {
        return 100;
    }
    if value >= worst {
        return 0;
    }
    to_score((worst - value) / (worst - best))
}

pub fn higher_is_better(value: f64, best: f64, worst: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    if value >= best {
        return 100;
    }
    if value <= worst {
        return 0;
    }
    to_score((value - worst) / (best - worst))
}

pub fn sweet_spot(value: f64, spot: SweetSpot) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    if value >= spot.ideal_min && value <= spot.ideal_max {
        return 100;
    }
    let (distance, span) = if value < spot.ideal_min {
        (spot.ideal_min - value, spot.ideal_min - spot.tolerance_min)
    } else {
        (value - spot.ideal_max, spot.tolerance_max - spot.ideal_max)
    };
    if span <= 0.0 {
        return 0;
    }
    to_score(1.0 - distance / span)
}

fn mean_of_two(a: u8, b: u8) -> u8 {
    ((a as f64 + b as f64) / 2.0).round() as u8
}

pub fn score_breakdown(asset: &FundamentalAsset, t: &ScoringThresholds) -> ScoreBreakdown {
    ScoreBreakdown {
        valuation: mean_of_two(
            lower_is_better(asset.pe, t.pe.best, t.pe.worst),
            lower_is_better(asset.pb, t.pb.best, t.pb.worst),
        ),
        profitability: mean_of_two(
            higher_is_better(asset.roe, t.roe.best, t.roe.worst),
            higher_is_better(asset.roic, t.roic.best, t.roic.worst),
        ),
        financial_health: lower_is_better(
            asset.net_debt_to_equity,
            t.net_debt_to_equity.best,
            t.net_debt_to_equity.worst,
        ),
        dividend: sweet_spot(asset.dividend_yield, t.dividend_yield),
    }
}

pub fn score_asset(asset: FundamentalAsset, thresholds: &ScoringThresholds) -> ScoredAsset {
    let breakdown = score_breakdown(&asset, thresholds);
    ScoredAsset {
        asset,
        score: breakdown.composite(),
        breakdown,
    }
}

/// Score every asset and sort by descending score. Equal scores keep their
/// input order.
pub fn score_assets(
    assets: Vec<FundamentalAsset>,
    thresholds: &ScoringThresholds,
) -> Vec<ScoredAsset> {
    let mut scored: Vec<ScoredAsset> = assets
        .into_iter()
        .map(|asset| score_asset(asset, thresholds))
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}
