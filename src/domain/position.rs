//! Purchase lots and aggregated positions.

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// A single purchase as entered by the user or imported from CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub ticker: String,
    pub quantity: f64,
    pub cost_basis: f64,
    pub last_price: f64,
}

impl Lot {
    pub fn new(ticker: &str, quantity: f64, cost_basis: f64, last_price: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            quantity,
            cost_basis,
            last_price,
        }
    }

    /// Only lots with a finite positive quantity and a finite cost take part
    /// in aggregation.
    pub fn is_mergeable(&self) -> bool {
        self.quantity.is_finite()
            && self.quantity > 0.0
            && self.cost_basis.is_finite()
            && !normalize_ticker(&self.ticker).is_empty()
    }
}

/// One holding per ticker, with a weighted-average cost basis.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub quantity: f64,
    pub cost_basis: f64,
    pub last_price: f64,
}

impl Position {
    pub fn market_value(&self) -> f64 {
        self.quantity * self.last_price
    }

    pub fn invested(&self) -> f64 {
        self.quantity * self.cost_basis
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.market_value() - self.invested()
    }

    /// Re-express the position as a single lot so it can be merged again.
    pub fn as_lot(&self) -> Lot {
        Lot {
            ticker: self.ticker.clone(),
            quantity: self.quantity,
            cost_basis: self.cost_basis,
            last_price: self.last_price,
        }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Position", 6)?;
        state.serialize_field("ticker", &self.ticker)?;
        state.serialize_field("quantity", &self.quantity)?;
        state.serialize_field("costBasis", &self.cost_basis)?;
        state.serialize_field("lastPrice", &self.last_price)?;
        state.serialize_field("marketValue", &self.market_value())?;
        state.serialize_field("unrealizedPnl", &self.unrealized_pnl())?;
        state.end()
    }
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            ticker: "AAPL".into(),
            quantity: 10.0,
            cost_basis: 150.0,
            last_price: 170.0,
        }
    }

    #[test]
    fn market_value() {
        assert!((sample_position().market_value() - 1700.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_profit() {
        assert!((sample_position().unrealized_pnl() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_loss() {
        let mut pos = sample_position();
        pos.last_price = 140.0;
        assert!((pos.unrealized_pnl() - (-100.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_ticker("  msft "), "MSFT");
        assert_eq!(normalize_ticker("air.pa"), "AIR.PA");
    }

    #[test]
    fn mergeable_lots() {
        assert!(Lot::new("A", 1.0, 10.0, 10.0).is_mergeable());
        assert!(!Lot::new("A", 0.0, 10.0, 10.0).is_mergeable());
        assert!(!Lot::new("A", -5.0, 10.0, 10.0).is_mergeable());
        assert!(!Lot::new("A", f64::NAN, 10.0, 10.0).is_mergeable());
        assert!(!Lot::new("A", 1.0, f64::INFINITY, 10.0).is_mergeable());
        assert!(!Lot::new("   ", 1.0, 10.0, 10.0).is_mergeable());
    }

    #[test]
    fn as_lot_preserves_fields() {
        let lot = sample_position().as_lot();
        assert_eq!(lot, Lot::new("AAPL", 10.0, 150.0, 170.0));
    }

    #[test]
    fn serializes_derived_fields() {
        let json = serde_json::to_value(sample_position()).unwrap();
        assert_eq!(json["marketValue"], 1700.0);
        assert_eq!(json["unrealizedPnl"], 200.0);
        assert_eq!(json["costBasis"], 150.0);
    }
}
