//! One-symbol evaluation pipeline: bands → positions → returns → scores.

use log::{debug, info, warn};

use crate::domain::error::BandtraderError;
use crate::domain::indicator::BandSet;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::metrics::{DEFAULT_RISK_FREE_RATE, PerformanceSummary};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::returns::{Evaluation, evaluate_returns};
use crate::domain::signal::{Position, SignalCounts, generate_positions};
use crate::ports::data_port::{DataPort, FetchRequest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationParams {
    pub window: usize,
    pub num_std: f64,
    pub risk_free_rate: f64,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            window: 20,
            num_std: 2.0,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub series: PriceSeries,
    pub params: EvaluationParams,
    pub bands: BandSet,
    pub positions: Vec<Position>,
    pub signals: SignalCounts,
    pub curves: Evaluation,
    pub market: PerformanceSummary,
    pub strategy: PerformanceSummary,
}

impl EvaluationReport {
    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }
}

pub fn evaluate(
    series: &PriceSeries,
    params: &EvaluationParams,
) -> Result<EvaluationReport, BandtraderError> {
    let bands = calculate_bollinger(series, params.window, params.num_std)?;
    debug!(
        "{}: {} over {} bars, {} defined",
        series.symbol(),
        bands.params,
        series.len(),
        bands.defined_count()
    );

    let positions = generate_positions(series, &bands);
    let signals = SignalCounts::tally(&positions);
    debug!(
        "{}: signals long={} short={} flat={}",
        series.symbol(),
        signals.long,
        signals.short,
        signals.flat
    );

    let curves = evaluate_returns(series, &positions)?;

    let market = PerformanceSummary::score(&curves.market, params.risk_free_rate);
    let strategy = PerformanceSummary::score(&curves.strategy, params.risk_free_rate);
    if strategy.is_degenerate() {
        debug!("{}: strategy has no downside deviation", series.symbol());
    }

    Ok(EvaluationReport {
        series: series.clone(),
        params: *params,
        bands,
        positions,
        signals,
        curves,
        market,
        strategy,
    })
}

/// Fetch and evaluate each symbol in turn. A failing symbol is reported in
/// its own slot and does not stop the others.
pub fn evaluate_many(
    data_port: &dyn DataPort,
    symbols: &[String],
    request: &FetchRequest,
    params: &EvaluationParams,
) -> Vec<(String, Result<EvaluationReport, BandtraderError>)> {
    symbols
        .iter()
        .map(|symbol| {
            info!(
                "Evaluating {} ({}, limit {})",
                symbol, request.interval, request.limit
            );
            let result = data_port
                .fetch_series(&request.with_symbol(symbol))
                .and_then(|series| evaluate(&series, params));
            if let Err(e) = &result {
                warn!("{}: {}", symbol, e);
            }
            (symbol.clone(), result)
        })
        .collect()
}
