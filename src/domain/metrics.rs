//! Performance scoring of a cumulative return curve.

use super::indicator::stddev::sample_std_dev;
use super::returns::ReturnCurve;

/// Calendar periods per year; crypto markets trade every day.
pub const PERIODS_PER_YEAR: f64 = 365.0;

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.0428;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    pub annual_return: f64,
    pub annual_downside_deviation: f64,
    /// Sortino-style ratio. `f64::NEG_INFINITY` when there is no downside
    /// deviation to normalize by.
    pub risk_adjusted_ratio: f64,
}

impl PerformanceSummary {
    pub fn score(curve: &ReturnCurve, risk_free_rate: f64) -> Self {
        let cumulative = curve.cumulative();

        let annual_return = round2(annual_return(&cumulative));
        let annual_downside_deviation = round2(annual_downside_deviation(&cumulative));

        let risk_adjusted_ratio = if annual_downside_deviation == 0.0 {
            f64::NEG_INFINITY
        } else {
            round2((annual_return - risk_free_rate) / annual_downside_deviation)
        };

        PerformanceSummary {
            annual_return,
            annual_downside_deviation,
            risk_adjusted_ratio,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.risk_adjusted_ratio == f64::NEG_INFINITY
    }
}

/// Total period return scaled linearly by 365/n (not compounded).
pub fn annual_return(cumulative: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (cumulative.first(), cumulative.last()) else {
        return 0.0;
    };
    if first == 0.0 {
        return 0.0;
    }
    let n = cumulative.len() as f64;
    (last / first - 1.0) * (PERIODS_PER_YEAR / n)
}

/// Relative change of each point against the previous one. A zero previous
/// value contributes a change of 0.
pub fn relative_changes(cumulative: &[f64]) -> Vec<f64> {
    cumulative
        .windows(2)
        .map(|w| {
            let prev = w[0];
            let curr = w[1];
            if prev != 0.0 {
                curr / prev - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Sample standard deviation of the negative relative changes (positive
/// changes count as zero), annualized by sqrt(365).
pub fn annual_downside_deviation(cumulative: &[f64]) -> f64 {
    let downside: Vec<f64> = relative_changes(cumulative)
        .into_iter()
        .map(|r| if r < 0.0 { r } else { 0.0 })
        .collect();

    sample_std_dev(&downside)
        .map(|std| std * PERIODS_PER_YEAR.sqrt())
        .unwrap_or(0.0)
}

pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        value
    }
}
