//! Declarative screening of fundamental records.
//!
//! A record passes when every filter matches (logical AND). Unknown fields,
//! wrong types and unparseable numbers exclude the record instead of failing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::fundamental::{
    FieldValue, FundamentalAsset, ScoredAsset, ScoringThresholds, score_assets,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::Less => "<",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">=" => Some(Comparison::GreaterOrEqual),
            "<=" => Some(Comparison::LessOrEqual),
            ">" => Some(Comparison::Greater),
            "<" => Some(Comparison::Less),
            _ => None,
        }
    }

    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::LessOrEqual => value <= threshold,
            Comparison::Greater => value > threshold,
            Comparison::Less => value < threshold,
        }
    }
}

/// Screening predicate. On the wire both variants share the
/// `{field, operator, value}` shape and are told apart by `operator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter", into = "RawFilter")]
pub enum ScreenerFilter {
    Numeric {
        field: String,
        operator: Comparison,
        threshold: f64,
    },
    Inclusion {
        field: String,
        allowed: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFilter {
    field: String,
    operator: String,
    value: serde_json::Value,
}

impl TryFrom<RawFilter> for ScreenerFilter {
    type Error = String;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        if raw.operator.eq_ignore_ascii_case("in") {
            let items = raw
                .value
                .as_array()
                .ok_or_else(|| format!("filter on {}: 'in' expects a list", raw.field))?;
            let allowed = items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        format!("filter on {}: 'in' list must hold strings", raw.field)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(ScreenerFilter::Inclusion {
                field: raw.field,
                allowed,
            });
        }

        let operator = Comparison::from_symbol(&raw.operator)
            .ok_or_else(|| format!("unknown filter operator '{}'", raw.operator))?;
        let threshold = match &raw.value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("filter on {}: threshold must be a number", raw.field))?;

        Ok(ScreenerFilter::Numeric {
            field: raw.field,
            operator,
            threshold,
        })
    }
}

impl From<ScreenerFilter> for RawFilter {
    fn from(filter: ScreenerFilter) -> Self {
        match filter {
            ScreenerFilter::Numeric {
                field,
                operator,
                threshold,
            } => RawFilter {
                field,
                operator: operator.symbol().to_string(),
                value: serde_json::json!(threshold),
            },
            ScreenerFilter::Inclusion { field, allowed } => RawFilter {
                field,
                operator: "in".to_string(),
                value: serde_json::json!(allowed),
            },
        }
    }
}

impl fmt::Display for ScreenerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenerFilter::Numeric {
                field,
                operator,
                threshold,
            } => write!(f, "{} {} {}", field, operator.symbol(), threshold),
            ScreenerFilter::Inclusion { field, allowed } => {
                write!(f, "{} in {}", field, allowed.join(", "))
            }
        }
    }
}

impl ScreenerFilter {
    pub fn matches(&self, asset: &FundamentalAsset) -> bool {
        match self {
            ScreenerFilter::Numeric {
                field,
                operator,
                threshold,
            } => {
                let value = match asset.field(field) {
                    Some(FieldValue::Number(v)) => v,
                    Some(FieldValue::Text(text)) => match text.trim().parse::<f64>() {
                        Ok(v) => v,
                        Err(_) => return false,
                    },
                    None => return false,
                };
                value.is_finite() && operator.compare(value, *threshold)
            }
            ScreenerFilter::Inclusion { field, allowed } => match asset.field(field) {
                Some(FieldValue::Text(text)) => {
                    let needle = text.to_lowercase();
                    allowed.iter().any(|a| a.to_lowercase() == needle)
                }
                _ => false,
            },
        }
    }
}

/// Keep the assets that satisfy every filter, in their original order.
pub fn run_screener(
    assets: Vec<FundamentalAsset>,
    filters: &[ScreenerFilter],
) -> Vec<FundamentalAsset> {
    if filters.is_empty() {
        return assets;
    }
    assets
        .into_iter()
        .filter(|asset| filters.iter().all(|f| f.matches(asset)))
        .collect()
}

/// Screen, then score and rank what remains.
pub fn screen_and_score(
    assets: Vec<FundamentalAsset>,
    filters: &[ScreenerFilter],
    thresholds: &ScoringThresholds,
) -> Vec<ScoredAsset> {
    score_assets(run_screener(assets, filters), thresholds)
}
