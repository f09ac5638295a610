//! Contrarian band signal.
//!
//! A close below the lower band goes long (expecting reversion upward), a
//! close above the upper band goes short. Anything else, including a close
//! exactly on a band or a bar whose band is still warming up, is flat.

use std::fmt;

use crate::domain::indicator::BandSet;
use crate::domain::ohlcv::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    Long,
    Short,
    #[default]
    Flat,
}

impl Position {
    /// Return multiplier: +1 long, -1 short, 0 flat.
    pub fn as_f64(self) -> f64 {
        match self {
            Position::Long => 1.0,
            Position::Short => -1.0,
            Position::Flat => 0.0,
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Position::Long => 1,
            Position::Short => -1,
            Position::Flat => 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Long => write!(f, "LONG"),
            Position::Short => write!(f, "SHORT"),
            Position::Flat => write!(f, "FLAT"),
        }
    }
}

/// Decide one position per bar using only that bar's close and band.
pub fn generate_positions(series: &PriceSeries, bands: &BandSet) -> Vec<Position> {
    series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| match bands.get(i) {
            Some(band) if bar.close < band.lower => Position::Long,
            Some(band) if bar.close > band.upper => Position::Short,
            _ => Position::Flat,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalCounts {
    pub long: usize,
    pub short: usize,
    pub flat: usize,
}

impl SignalCounts {
    pub fn tally(positions: &[Position]) -> Self {
        positions.iter().fold(Self::default(), |mut acc, p| {
            match p {
                Position::Long => acc.long += 1,
                Position::Short => acc.short += 1,
                Position::Flat => acc.flat += 1,
            }
            acc
        })
    }
}
