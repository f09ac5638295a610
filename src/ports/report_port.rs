//! Report generation port trait.

use std::path::Path;

use crate::domain::error::BandtraderError;
use crate::domain::evaluation::EvaluationReport;
use crate::domain::ohlcv::PriceSeries;

/// Port for rendering evaluation results and raw price curves.
pub trait ReportPort {
    fn write_returns(&self, report: &EvaluationReport, output_path: &Path)
        -> Result<(), BandtraderError>;

    fn write_prices(&self, series: &[PriceSeries], output_path: &Path)
        -> Result<(), BandtraderError>;
}
