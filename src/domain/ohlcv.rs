//! OHLC bar and price series representation.

use chrono::NaiveDateTime;

use crate::domain::error::BandtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Ordered bars for one symbol, oldest first.
///
/// Construction enforces strictly increasing timestamps, finite positive
/// closes, and rejects an empty bar list, so every `PriceSeries` in the crate
/// is non-empty, ordered, and safe to take close-to-close ratios over.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BandtraderError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(BandtraderError::unavailable(&symbol, "no bars returned"));
        }

        if let Some(w) = bars.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(BandtraderError::InvalidSeries {
                symbol,
                reason: format!(
                    "timestamps not strictly increasing at {} -> {}",
                    w[0].timestamp, w[1].timestamp
                ),
            });
        }

        if let Some(bar) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
            return Err(BandtraderError::InvalidSeries {
                symbol,
                reason: format!("close {} at {} is not a positive number", bar.close, bar.timestamp),
            });
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn first_timestamp(&self) -> NaiveDateTime {
        self.bars[0].timestamp
    }

    pub fn last_timestamp(&self) -> NaiveDateTime {
        self.bars[self.bars.len() - 1].timestamp
    }
}
