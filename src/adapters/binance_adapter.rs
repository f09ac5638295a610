//! Binance public market-data adapter.
//!
//! Fetches candlesticks from `/api/v3/klines` and the tradable pair list from
//! `/api/v3/exchangeInfo`. Transport failures and 5xx responses are retried
//! with exponential backoff; everything else fails immediately.

use crate::domain::config_validation::MAX_RETRIES;
use crate::domain::error::BandtraderError;
use crate::domain::ohlcv::{Bar, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, FetchRequest, MAX_LIMIT};
use chrono::{DateTime, NaiveDateTime};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,
}

pub struct BinanceAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BandtraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BandtraderError::invalid_param("http_client", e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BandtraderError> {
        let base_url = config
            .get_string("data", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = config.get_int("data", "timeout_secs", 30).max(1) as u64;
        let mut adapter = Self::new(&base_url, Duration::from_secs(timeout_secs))?;
        adapter.max_retries = config
            .get_int("data", "max_retries", 2)
            .clamp(0, MAX_RETRIES) as u32;
        Ok(adapter)
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Build the klines GET. Query values are percent-encoded by reqwest.
    pub fn klines_request(
        &self,
        request: &FetchRequest,
    ) -> Result<reqwest::blocking::Request, BandtraderError> {
        let symbol = request.symbol.to_uppercase();
        self.client
            .get(format!("{}/api/v3/klines", self.base_url))
            .query(&[
                ("symbol", symbol.clone()),
                ("interval", request.interval.to_string()),
                ("limit", request.limit.clamp(1, MAX_LIMIT).to_string()),
            ])
            .build()
            .map_err(|e| BandtraderError::unavailable(&symbol, e.to_string()))
    }

    pub fn exchange_info_request(&self) -> Result<reqwest::blocking::Request, BandtraderError> {
        self.client
            .get(format!("{}/api/v3/exchangeInfo", self.base_url))
            .build()
            .map_err(|e| BandtraderError::unavailable("*", e.to_string()))
    }

    /// Delay before retry `attempt` (1-based): base, 2x base, 4x base, ...
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Send with retry on transport errors and 5xx. Returns the response body.
    fn send_with_retry(
        &self,
        request: reqwest::blocking::Request,
        symbol: &str,
    ) -> Result<String, BandtraderError> {
        let url = request.url().clone();
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_delay(attempt);
                debug!("{}: retry {} after {:?}", symbol, attempt, delay);
                std::thread::sleep(delay);
            }

            let attempt_request = request
                .try_clone()
                .ok_or_else(|| BandtraderError::unavailable(symbol, "request cannot be retried"))?;

            match self.client.execute(attempt_request) {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_server_error() {
                        warn!("{}: HTTP {} from {}", symbol, status, url);
                        last_error = Some(format!("HTTP {}", status));
                        continue;
                    }
                    if !status.is_success() {
                        let body = resp.text().unwrap_or_default();
                        return Err(BandtraderError::unavailable(
                            symbol,
                            format!("HTTP {}: {}", status, body.trim()),
                        ));
                    }
                    return resp
                        .text()
                        .map_err(|e| BandtraderError::unavailable(symbol, e.to_string()));
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    warn!("{}: {}", symbol, e);
                    last_error = Some(e.to_string());
                }
                Err(e) => return Err(BandtraderError::unavailable(symbol, e.to_string())),
            }
        }

        Err(BandtraderError::unavailable(
            symbol,
            last_error.unwrap_or_else(|| "max retries exceeded".into()),
        ))
    }
}

fn field_f64(row: &[Value], index: usize, name: &str, symbol: &str) -> Result<f64, BandtraderError> {
    let value = row
        .get(index)
        .ok_or_else(|| BandtraderError::unavailable(symbol, format!("kline missing {}", name)))?;
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        BandtraderError::unavailable(symbol, format!("invalid {} value: {}", name, value))
    })
}

/// Parse a klines payload: an array of arrays whose first five entries are
/// open time (ms), open, high, low, close.
pub fn parse_klines(
    symbol: &str,
    body: &str,
    end_exclusive: Option<NaiveDateTime>,
) -> Result<PriceSeries, BandtraderError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| BandtraderError::unavailable(symbol, format!("malformed klines: {}", e)))?;

    let mut bars = Vec::with_capacity(rows.len());
    for row in &rows {
        let open_time = row
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| BandtraderError::unavailable(symbol, "kline missing open time"))?;
        let timestamp = DateTime::from_timestamp_millis(open_time)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| {
                BandtraderError::unavailable(symbol, format!("invalid timestamp: {}", open_time))
            })?;

        if end_exclusive.is_some_and(|cutoff| timestamp >= cutoff) {
            continue;
        }

        bars.push(Bar {
            timestamp,
            open: field_f64(row, 1, "open", symbol)?,
            high: field_f64(row, 2, "high", symbol)?,
            low: field_f64(row, 3, "low", symbol)?,
            close: field_f64(row, 4, "close", symbol)?,
        });
    }

    PriceSeries::new(symbol, bars)
}

pub fn parse_exchange_info(body: &str) -> Result<Vec<String>, BandtraderError> {
    let info: ExchangeInfo = serde_json::from_str(body)
        .map_err(|e| BandtraderError::unavailable("*", format!("malformed exchangeInfo: {}", e)))?;
    Ok(info.symbols.into_iter().map(|s| s.symbol).collect())
}

impl DataPort for BinanceAdapter {
    fn fetch_series(&self, request: &FetchRequest) -> Result<PriceSeries, BandtraderError> {
        let symbol = request.symbol.to_uppercase();
        let http_request = self.klines_request(request)?;
        debug!("GET {}", http_request.url());

        let body = self.send_with_retry(http_request, &symbol)?;
        let cutoff = request
            .end_exclusive
            .and_then(|d| d.and_hms_opt(0, 0, 0));
        let series = parse_klines(&symbol, &body, cutoff)?;

        info!(
            "{}: fetched {} bars ({} to {})",
            symbol,
            series.len(),
            series.first_timestamp(),
            series.last_timestamp()
        );
        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BandtraderError> {
        let http_request = self.exchange_info_request()?;
        debug!("GET {}", http_request.url());
        let body = self.send_with_retry(http_request, "*")?;
        parse_exchange_info(&body)
    }
}
