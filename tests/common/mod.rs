#![allow(dead_code)]

use chrono::{Days, NaiveDate};
pub use stockscope::domain::ohlcv::Candle;
use stockscope::domain::error::StockscopeError;
use stockscope::domain::fundamental::FundamentalAsset;
use stockscope::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, ticker: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(ticker.to_string(), candles);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, StockscopeError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(StockscopeError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|candles| {
                candles
                    .iter()
                    .filter(|c| c.date >= start_date && c.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, StockscopeError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_candle(date: NaiveDate, close: f64) -> Candle {
    Candle {
        date,
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// Consecutive daily candles starting at `start`, one per close.
pub fn candles_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_candle(start + Days::new(i as u64), close))
        .collect()
}

/// A linear price path: `start_price + step * i`.
pub fn generate_candles(start: NaiveDate, count: usize, start_price: f64, step: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + step * i as f64).collect();
    candles_from_closes(start, &closes)
}

pub fn make_asset(ticker: &str, sector: &str, pe: f64, pb: f64, roe: f64) -> FundamentalAsset {
    FundamentalAsset {
        isin: format!("XX{ticker}"),
        ticker: ticker.to_string(),
        name: format!("{ticker} Corp"),
        country: "US".to_string(),
        sector: sector.to_string(),
        currency: "USD".to_string(),
        market_cap: 1_000_000.0,
        pe,
        pb,
        roe,
        roic: 12.0,
        dividend_yield: 3.0,
        net_debt_to_equity: 50.0,
    }
}
