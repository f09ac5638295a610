//! CSV file data adapter.
//!
//! One file per symbol, `{base_path}/{SYMBOL}.csv`, with a
//! `timestamp,open,high,low,close` header. Timestamps are `YYYY-MM-DD` or
//! `YYYY-MM-DD HH:MM:SS` (UTC).

use crate::domain::error::BandtraderError;
use crate::domain::ohlcv::{Bar, PriceSeries};
use crate::ports::data_port::{DataPort, FetchRequest};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_price(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<f64, BandtraderError> {
    record
        .get(index)
        .ok_or_else(|| BandtraderError::unavailable(symbol, format!("missing {} column", name)))?
        .trim()
        .parse()
        .map_err(|e| BandtraderError::unavailable(symbol, format!("invalid {} value: {}", name, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, request: &FetchRequest) -> Result<PriceSeries, BandtraderError> {
        let symbol = request.symbol.as_str();
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            BandtraderError::unavailable(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;

        let cutoff = request
            .end_exclusive
            .and_then(|d| d.and_hms_opt(0, 0, 0));

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result
                .map_err(|e| BandtraderError::unavailable(symbol, format!("CSV parse error: {}", e)))?;

            let ts_str = record
                .get(0)
                .ok_or_else(|| BandtraderError::unavailable(symbol, "missing timestamp column"))?;
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| {
                BandtraderError::unavailable(symbol, format!("invalid timestamp '{}'", ts_str))
            })?;

            if cutoff.is_some_and(|c| timestamp >= c) {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: parse_price(&record, 1, "open", symbol)?,
                high: parse_price(&record, 2, "high", symbol)?,
                low: parse_price(&record, 3, "low", symbol)?,
                close: parse_price(&record, 4, "close", symbol)?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        if bars.len() > request.limit {
            bars.drain(..bars.len() - request.limit);
        }
        debug!("{}: read {} bars from {}", symbol, bars.len(), path.display());

        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BandtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            BandtraderError::unavailable(
                "*",
                format!("failed to read directory {}: {}", self.base_path.display(), e),
            )
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| BandtraderError::unavailable("*", format!("directory entry error: {}", e)))?
                .path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close\n\
            2024-05-27,102.0,112.0,95.0,110.0\n\
            2024-05-24,100.0,110.0,90.0,105.0\n\
            2024-05-25,105.0,115.0,100.0,110.0\n\
            2024-05-26 00:00:00,110.0,120.0,105.0,115.0\n";

        fs::write(path.join("BTCUSDT.csv"), csv_content).unwrap();
        fs::write(path.join("ETHUSDT.csv"), "timestamp,open,high,low,close\n").unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fetch_series_sorts_and_parses() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_series(&FetchRequest::new("BTCUSDT")).unwrap();

        assert_eq!(series.len(), 4);
        let first = &series.bars()[0];
        assert_eq!(first.timestamp, date(2024, 5, 24).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(first.open, 100.0);
        assert_eq!(first.high, 110.0);
        assert_eq!(first.low, 90.0);
        assert_eq!(first.close, 105.0);
    }

    #[test]
    fn fetch_series_applies_exclusive_end_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let mut request = FetchRequest::new("BTCUSDT");
        request.end_exclusive = Some(date(2024, 5, 26));
        let series = adapter.fetch_series(&request).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series.last_timestamp(),
            date(2024, 5, 25).and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn fetch_series_keeps_newest_limit_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let mut request = FetchRequest::new("BTCUSDT");
        request.limit = 2;
        let series = adapter.fetch_series(&request).unwrap();

        assert_eq!(series.closes(), vec![115.0, 110.0]);
    }

    #[test]
    fn fetch_series_empty_file_is_unavailable() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series(&FetchRequest::new("ETHUSDT")).unwrap_err();
        assert!(matches!(err, BandtraderError::DataUnavailable { .. }));
    }

    #[test]
    fn fetch_series_missing_file_is_unavailable() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_series(&FetchRequest::new("XYZ")).unwrap_err();
        assert!(matches!(err, BandtraderError::DataUnavailable { .. }));
    }

    #[test]
    fn fetch_series_rejects_bad_price() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close\n2024-01-01,1.0,2.0,0.5,abc\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_series(&FetchRequest::new("BAD")).unwrap_err();
        assert!(err.to_string().contains("invalid close value"));
    }

    #[test]
    fn fetch_series_rejects_nan_close() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("NAN.csv"),
            "timestamp,open,high,low,close\n2024-01-01,1.0,2.0,0.5,1.5\n2024-01-02,1.0,2.0,0.5,NaN\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_series(&FetchRequest::new("NAN")).unwrap_err();
        assert!(matches!(err, BandtraderError::InvalidSeries { .. }));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.list_symbols().unwrap(), vec!["BTCUSDT", "ETHUSDT"]);
    }
}
