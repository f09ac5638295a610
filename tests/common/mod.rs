#![allow(dead_code)]

use bandtrader::domain::error::BandtraderError;
pub use bandtrader::domain::ohlcv::{Bar, PriceSeries};
use bandtrader::ports::data_port::{DataPort, FetchRequest};
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<FetchRequest>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_series(mut self, symbol: &str, prices: &[f64]) -> Self {
        self.data
            .insert(symbol.to_string(), make_bars("2024-01-01", prices));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, request: &FetchRequest) -> Result<PriceSeries, BandtraderError> {
        self.requests.borrow_mut().push(request.clone());
        if let Some(reason) = self.errors.get(&request.symbol) {
            return Err(BandtraderError::DataUnavailable {
                symbol: request.symbol.clone(),
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(&request.symbol).cloned().unwrap_or_default();
        PriceSeries::new(request.symbol.clone(), bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BandtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(date_str: &str) -> NaiveDateTime {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> Bar {
    Bar {
        timestamp: midnight(date_str),
        open: close,
        high: close,
        low: close,
        close,
    }
}

/// Daily bars starting at `start`, one per price.
pub fn make_bars(start: &str, prices: &[f64]) -> Vec<Bar> {
    let start = midnight(start);
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
        })
        .collect()
}

pub fn make_series(symbol: &str, prices: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, make_bars("2024-01-01", prices)).unwrap()
}

/// A zig-zag around 100 that pierces the bands often enough to trade.
pub fn oscillating_prices(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let swing = if i % 7 == 0 { 12.0 } else { 2.0 };
            if i % 2 == 0 { 100.0 + swing } else { 100.0 - swing }
        })
        .collect()
}
