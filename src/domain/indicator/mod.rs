//! Volatility band indicator types.
//!
//! - `BandPoint`: moving average, standard deviation and both bands at one bar
//! - `BandSet`: per-bar optional points aligned 1:1 with a `PriceSeries`
//! - `BandParams`: identity + parameters of a band computation

pub mod bollinger;
pub mod stddev;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    pub moving_average: f64,
    pub std_dev: f64,
    pub upper: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParams {
    pub window: usize,
    pub num_std: f64,
}

/// Band values aligned with the source series. Bars before the window fills
/// hold `None`.
#[derive(Debug, Clone)]
pub struct BandSet {
    pub params: BandParams,
    pub points: Vec<Option<BandPoint>>,
}

impl BandSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BandPoint> {
        self.points.get(index).and_then(Option::as_ref)
    }

    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }
}

impl fmt::Display for BandParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BOLLINGER({},{})", self.window, self.num_std)
    }
}
