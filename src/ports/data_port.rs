//! Market data access port trait.

use crate::domain::error::StockscopeError;
use crate::domain::ohlcv::Candle;
use chrono::NaiveDate;

pub trait DataPort {
    /// Candles for `ticker` within `[start_date, end_date]`, oldest first.
    fn fetch_candles(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, StockscopeError>;

    fn list_tickers(&self) -> Result<Vec<String>, StockscopeError>;
}
