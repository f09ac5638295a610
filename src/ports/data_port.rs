//! Price data access port trait.

use crate::domain::error::BandtraderError;
use crate::domain::interval::Interval;
use crate::domain::ohlcv::PriceSeries;
use chrono::NaiveDate;

/// Upstream maximum for a single klines request.
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub symbol: String,
    pub interval: Interval,
    pub limit: usize,
    /// Bars at or after midnight UTC of this date are dropped.
    pub end_exclusive: Option<NaiveDate>,
}

impl FetchRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: Interval::default(),
            limit: MAX_LIMIT,
            end_exclusive: None,
        }
    }

    pub fn with_symbol(&self, symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..self.clone()
        }
    }
}

pub trait DataPort {
    /// Fetch an ordered, non-empty series. An upstream error or an empty
    /// result is `DataUnavailable`.
    fn fetch_series(&self, request: &FetchRequest) -> Result<PriceSeries, BandtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, BandtraderError>;
}
