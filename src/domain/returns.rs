//! Period and cumulative return curves for the market and the strategy.
//!
//! The position decided at bar i-1's close earns bar i's return, so a signal
//! never trades on the close it was computed from.

use chrono::NaiveDateTime;

use crate::domain::error::BandtraderError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::signal::Position;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint {
    pub timestamp: NaiveDateTime,
    /// `None` at the first bar.
    pub period_return: Option<f64>,
    pub cumulative: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ReturnCurve {
    pub points: Vec<ReturnPoint>,
}

impl ReturnCurve {
    /// Compound a sequence of period returns into a curve based at 1.0.
    /// `returns[0]` must be `None`; later `None`s are treated as zero.
    fn compound(timestamps: &[NaiveDateTime], returns: &[Option<f64>]) -> Self {
        let mut cumulative = 1.0;
        let points = timestamps
            .iter()
            .zip(returns)
            .map(|(&timestamp, &period_return)| {
                cumulative *= 1.0 + period_return.unwrap_or(0.0);
                ReturnPoint {
                    timestamp,
                    period_return,
                    cumulative,
                }
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn cumulative(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cumulative).collect()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.cumulative)
    }
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub market: ReturnCurve,
    pub strategy: ReturnCurve,
}

pub fn evaluate_returns(
    series: &PriceSeries,
    positions: &[Position],
) -> Result<Evaluation, BandtraderError> {
    if positions.len() != series.len() {
        return Err(BandtraderError::invalid_param(
            "positions",
            format!(
                "expected {} positions for {}, got {}",
                series.len(),
                series.symbol(),
                positions.len()
            ),
        ));
    }

    let bars = series.bars();
    let timestamps = series.timestamps();

    let mut market_returns: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut strategy_returns: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    market_returns.push(None);
    strategy_returns.push(None);

    for i in 1..bars.len() {
        let r = bars[i].close / bars[i - 1].close - 1.0;
        market_returns.push(Some(r));
        strategy_returns.push(Some(positions[i - 1].as_f64() * r));
    }

    Ok(Evaluation {
        market: ReturnCurve::compound(&timestamps, &market_returns),
        strategy: ReturnCurve::compound(&timestamps, &strategy_returns),
    })
}
