//! Position aggregation and portfolio state.
//!
//! Aggregation is cost-preserving: merging lots never changes the total
//! invested amount, it only re-expresses it as a weighted-average cost.
//! `Portfolio` is an immutable value; every operation returns the next state.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::HashMap;

use super::position::{Lot, Position, normalize_ticker};

struct Accumulator {
    ticker: String,
    quantity: f64,
    invested: f64,
    last_price: Option<f64>,
}

/// Merge lots into one position per normalized ticker, in order of first
/// appearance. Lots that are not mergeable are dropped. The last price is the
/// one from the most recent lot that carried a finite price, falling back to
/// the weighted-average cost.
pub fn aggregate(lots: &[Lot]) -> Vec<Position> {
    let mut order: Vec<Accumulator> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for lot in lots.iter().filter(|l| l.is_mergeable()) {
        let ticker = normalize_ticker(&lot.ticker);
        let slot = *index.entry(ticker.clone()).or_insert_with(|| {
            order.push(Accumulator {
                ticker,
                quantity: 0.0,
                invested: 0.0,
                last_price: None,
            });
            order.len() - 1
        });

        let acc = &mut order[slot];
        acc.quantity += lot.quantity;
        acc.invested += lot.quantity * lot.cost_basis;
        if lot.last_price.is_finite() {
            acc.last_price = Some(lot.last_price);
        }
    }

    order
        .into_iter()
        .map(|acc| {
            let cost_basis = if acc.quantity > 0.0 {
                acc.invested / acc.quantity
            } else {
                0.0
            };
            Position {
                ticker: acc.ticker,
                quantity: acc.quantity,
                cost_basis,
                last_price: acc.last_price.unwrap_or(cost_basis),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    positions: Vec<Position>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lots(lots: &[Lot]) -> Self {
        Portfolio {
            positions: aggregate(lots),
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn get(&self, ticker: &str) -> Option<&Position> {
        let ticker = normalize_ticker(ticker);
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn add_lot(&self, lot: &Lot) -> Portfolio {
        self.merge(std::slice::from_ref(lot))
    }

    /// Existing positions take part as lots, so merging in batches gives the
    /// same result as aggregating everything at once.
    pub fn merge(&self, lots: &[Lot]) -> Portfolio {
        let combined: Vec<Lot> = self
            .positions
            .iter()
            .map(Position::as_lot)
            .chain(lots.iter().cloned())
            .collect();
        Portfolio::from_lots(&combined)
    }

    pub fn remove(&self, ticker: &str) -> Portfolio {
        let ticker = normalize_ticker(ticker);
        Portfolio {
            positions: self
                .positions
                .iter()
                .filter(|p| p.ticker != ticker)
                .cloned()
                .collect(),
        }
    }

    /// Replace last prices from a quote map keyed by ticker. Tickers without a
    /// finite quote keep their previous price.
    pub fn reprice(&self, quotes: &HashMap<String, f64>) -> Portfolio {
        let quotes: HashMap<String, f64> = quotes
            .iter()
            .filter(|(_, price)| price.is_finite())
            .map(|(ticker, price)| (normalize_ticker(ticker), *price))
            .collect();

        Portfolio {
            positions: self
                .positions
                .iter()
                .map(|p| Position {
                    last_price: quotes.get(&p.ticker).copied().unwrap_or(p.last_price),
                    ..p.clone()
                })
                .collect(),
        }
    }

    pub fn reset(&self) -> Portfolio {
        Portfolio::new()
    }

    pub fn total_market_value(&self) -> f64 {
        self.positions.iter().map(Position::market_value).sum()
    }

    pub fn total_invested(&self) -> f64 {
        self.positions.iter().map(Position::invested).sum()
    }

    pub fn total_unrealized_pnl(&self) -> f64 {
        self.positions.iter().map(Position::unrealized_pnl).sum()
    }
}

impl Serialize for Portfolio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Portfolio", 4)?;
        state.serialize_field("positions", &self.positions)?;
        state.serialize_field("totalMarketValue", &self.total_market_value())?;
        state.serialize_field("totalInvested", &self.total_invested())?;
        state.serialize_field("totalUnrealizedPnl", &self.total_unrealized_pnl())?;
        state.end()
    }
}
