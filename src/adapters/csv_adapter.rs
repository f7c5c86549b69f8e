//! CSV file adapters: daily candles per ticker, fundamentals and lots.

use crate::domain::error::StockscopeError;
use crate::domain::fundamental::FundamentalAsset;
use crate::domain::ohlcv::Candle;
use crate::domain::position::{Lot, normalize_ticker};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Reads `<TICKER>.csv` files (`date,open,high,low,close,volume`) from a directory.
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", normalize_ticker(ticker)))
    }
}

fn reader_for(path: &Path) -> Result<csv::Reader<fs::File>, StockscopeError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| StockscopeError::Data {
            reason: format!("failed to open {}: {}", path.display(), e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, StockscopeError> {
        let path = self.csv_path(ticker);
        if !path.is_file() {
            return Err(StockscopeError::NoData {
                ticker: normalize_ticker(ticker),
            });
        }

        let mut rdr = reader_for(&path)?;
        let mut candles = Vec::new();

        for (row, result) in rdr.deserialize::<Candle>().enumerate() {
            let candle = result.map_err(|e| StockscopeError::Data {
                reason: format!("{} row {}: {}", path.display(), row + 1, e),
            })?;
            if candle.date < start_date || candle.date > end_date {
                continue;
            }
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.date);
        tracing::debug!(file = %path.display(), candles = candles.len(), "loaded candles");
        Ok(candles)
    }

    fn list_tickers(&self) -> Result<Vec<String>, StockscopeError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StockscopeError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tickers.push(normalize_ticker(stem));
            }
        }

        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }
}

const SAMPLE_FUNDAMENTALS: &str = include_str!("sample_fundamentals.csv");

/// Load fundamental rows. Empty or unparseable numeric cells become NaN.
pub fn read_fundamentals(path: &Path) -> Result<Vec<FundamentalAsset>, StockscopeError> {
    let rdr = reader_for(path)?;
    let assets = parse_fundamentals(rdr, &path.display().to_string())?;
    tracing::info!(file = %path.display(), assets = assets.len(), "loaded fundamentals");
    Ok(assets)
}

/// The bundled demo universe, used when no fundamentals file is given.
pub fn sample_fundamentals() -> Result<Vec<FundamentalAsset>, StockscopeError> {
    let rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(SAMPLE_FUNDAMENTALS.as_bytes());
    let assets = parse_fundamentals(rdr, "<sample>")?;
    tracing::info!(assets = assets.len(), "using bundled sample fundamentals");
    Ok(assets)
}

fn parse_fundamentals<R: Read>(
    mut rdr: csv::Reader<R>,
    source: &str,
) -> Result<Vec<FundamentalAsset>, StockscopeError> {
    rdr.deserialize::<FundamentalAsset>()
        .enumerate()
        .map(|(row, result)| {
            result.map_err(|e| StockscopeError::Data {
                reason: format!("{} row {}: {}", source, row + 1, e),
            })
        })
        .collect()
}

/// Load purchase lots from `ticker,quantity,cost_basis[,last_price]`.
///
/// Headers match case-insensitively. Rows that could not take part in
/// aggregation are skipped with a warning.
pub fn read_lots(path: &Path) -> Result<Vec<Lot>, StockscopeError> {
    let mut rdr = reader_for(path)?;
    let headers = rdr
        .headers()
        .map_err(|e| StockscopeError::Data {
            reason: format!("{}: {}", path.display(), e),
        })?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let required = |name: &str| {
        column(name).ok_or_else(|| StockscopeError::Data {
            reason: format!("{}: missing column {}", path.display(), name),
        })
    };
    let ticker_col = required("ticker")?;
    let quantity_col = required("quantity")?;
    let cost_col = required("cost_basis")?;
    let last_col = column("last_price");

    let number = |cell: Option<&str>| -> f64 {
        cell.and_then(|v| v.trim().parse().ok()).unwrap_or(f64::NAN)
    };

    let mut lots = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| StockscopeError::Data {
            reason: format!("{} row {}: {}", path.display(), row + 1, e),
        })?;

        let ticker = record.get(ticker_col).unwrap_or_default();
        let cost_basis = number(record.get(cost_col));
        // Missing quotes stay NaN so aggregation keeps an earlier finite price.
        let last_price = last_col.map_or(f64::NAN, |c| number(record.get(c)));
        let lot = Lot::new(ticker, number(record.get(quantity_col)), cost_basis, last_price);

        if lot.is_mergeable() && lot.cost_basis > 0.0 {
            lots.push(lot);
        } else {
            tracing::warn!(row = row + 1, ticker, "skipping invalid lot");
        }
    }

    tracing::info!(file = %path.display(), lots = lots.len(), "loaded lots");
    Ok(lots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::portfolio::aggregate;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("AAPL.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_candles_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let candles = adapter.fetch_candles("aapl", day(1), day(31)).unwrap();

        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].date, day(15));
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].high, 110.0);
        assert_eq!(candles[0].low, 90.0);
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[0].volume, 50000.0);
        assert_eq!(candles[2].date, day(17));
    }

    #[test]
    fn fetch_candles_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let candles = adapter.fetch_candles("AAPL", day(16), day(16)).unwrap();

        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].date, day(16));
    }

    #[test]
    fn fetch_candles_reports_missing_file_as_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_candles("XYZ", day(1), day(31));
        assert!(matches!(result, Err(StockscopeError::NoData { ticker }) if ticker == "XYZ"));
    }

    #[test]
    fn fetch_candles_rejects_malformed_rows() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_candles("BAD", day(1), day(31));
        assert!(matches!(result, Err(StockscopeError::Data { .. })));
    }

    #[test]
    fn list_tickers_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.list_tickers().unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn read_fundamentals_treats_blank_numbers_as_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fundamentals.csv");
        fs::write(
            &path,
            "isin,ticker,name,country,sector,currency,market_cap,pe,pb,roe,roic,dividend_yield,net_debt_to_equity\n\
             US0378331005,AAPL,Apple,US,Technology,USD,3000000,28.5,45,150,55,0.5,120\n\
             DE0007164600,SAP,SAP SE,DE,Technology,EUR,,n/a,6,18,14,1.2,\n",
        )
        .unwrap();

        let assets = read_fundamentals(&path).unwrap();

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].ticker, "AAPL");
        assert_eq!(assets[0].pe, 28.5);
        assert_eq!(assets[0].dividend_yield, 0.5);
        assert!(assets[1].market_cap.is_nan());
        assert!(assets[1].pe.is_nan());
        assert!(assets[1].net_debt_to_equity.is_nan());
        assert_eq!(assets[1].roe, 18.0);
    }

    #[test]
    fn sample_fundamentals_are_complete() {
        let assets = sample_fundamentals().unwrap();

        assert_eq!(assets.len(), 5);
        assert!(assets.iter().any(|a| a.ticker == "AIR.PA"));
        let msft = assets.iter().find(|a| a.ticker == "MSFT").unwrap();
        assert_eq!(msft.pe, 33.2);
        assert_eq!(msft.sector, "Technology");
        assert!(assets.iter().all(|a| a.roe.is_finite() && a.dividend_yield.is_finite()));
    }

    #[test]
    fn read_lots_matches_headers_and_skips_invalid_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lots.csv");
        fs::write(
            &path,
            " Ticker ,QUANTITY,Cost_Basis,last_price\n\
             aapl,10,150,180\n\
             msft,5,300,\n\
             ,3,10,10\n\
             tsla,0,200,210\n\
             nvda,abc,100,120\n",
        )
        .unwrap();

        let lots = read_lots(&path).unwrap();

        assert_eq!(lots.len(), 2);
        assert_eq!(lots[0], Lot::new("aapl", 10.0, 150.0, 180.0));
        assert!(lots[1].last_price.is_nan());
    }

    #[test]
    fn unquoted_lot_keeps_earlier_quote_after_aggregation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lots.csv");
        fs::write(
            &path,
            "ticker,quantity,cost_basis,last_price\n\
             aapl,10,100,150\n\
             AAPL,5,120,\n",
        )
        .unwrap();

        let lots = read_lots(&path).unwrap();
        let positions = aggregate(&lots);

        assert_eq!(positions.len(), 1);
        let aapl = &positions[0];
        assert_eq!(aapl.quantity, 15.0);
        assert_relative_eq!(aapl.cost_basis, 1600.0 / 15.0, epsilon = 1e-9);
        assert_eq!(aapl.last_price, 150.0);
        assert_relative_eq!(aapl.market_value(), 2250.0, epsilon = 1e-9);
    }

    #[test]
    fn lots_without_any_quote_fall_back_to_weighted_cost() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lots.csv");
        fs::write(&path, "ticker,quantity,cost_basis\nmsft,2,300\nMSFT,2,400\n").unwrap();

        let positions = aggregate(&read_lots(&path).unwrap());

        assert_eq!(positions.len(), 1);
        assert_relative_eq!(positions[0].last_price, 350.0, epsilon = 1e-9);
    }

    #[test]
    fn read_lots_requires_core_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lots.csv");
        fs::write(&path, "ticker,quantity\nAAPL,1\n").unwrap();

        assert!(matches!(read_lots(&path), Err(StockscopeError::Data { .. })));
    }
}
