//! SVG report generation.
//!
//! Renders the cumulative market vs strategy curves of one evaluation, and a
//! row of close-price panels for several symbols, as standalone SVG files.

pub mod chart_svg;

use std::fs;
use std::path::Path;

use log::info;

use crate::domain::error::BandtraderError;
use crate::domain::evaluation::EvaluationReport;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::report_port::ReportPort;
use chart_svg::{ChartSpec, LineSeries, render_chart_group, wrap_document};

const RETURNS_WIDTH: f64 = 1400.0;
const RETURNS_HEIGHT: f64 = 300.0;
const PANEL_WIDTH: f64 = 320.0;
const PANEL_HEIGHT: f64 = 300.0;

pub struct SvgReportAdapter;

impl SvgReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn render_returns(&self, report: &EvaluationReport) -> String {
        let timestamps = report.series.timestamps();
        let market = report.curves.market.cumulative();
        let strategy = report.curves.strategy.cumulative();
        let lines = [
            LineSeries {
                label: "Market Return",
                color: "blue",
                values: &market,
            },
            LineSeries {
                label: "Strategy Return",
                color: "orange",
                values: &strategy,
            },
        ];
        let title = format!(
            "Cumulative Returns: Market vs. Bollinger Bands Strategy ({})",
            report.symbol()
        );
        let spec = ChartSpec {
            title: &title,
            y_label: "Cumulative Return",
            width: RETURNS_WIDTH,
            height: RETURNS_HEIGHT,
            timestamps: &timestamps,
            lines: &lines,
        };
        wrap_document(RETURNS_WIDTH, RETURNS_HEIGHT, &render_chart_group(&spec, 0.0, 0.0))
    }

    pub fn render_prices(&self, series: &[PriceSeries]) -> String {
        let width = PANEL_WIDTH * series.len().max(1) as f64;
        let body: String = series
            .iter()
            .enumerate()
            .map(|(k, s)| {
                let timestamps = s.timestamps();
                let closes = s.closes();
                let lines = [LineSeries {
                    label: s.symbol(),
                    color: "steelblue",
                    values: &closes,
                }];
                let spec = ChartSpec {
                    title: s.symbol(),
                    y_label: "close",
                    width: PANEL_WIDTH,
                    height: PANEL_HEIGHT,
                    timestamps: &timestamps,
                    lines: &lines,
                };
                render_chart_group(&spec, PANEL_WIDTH * k as f64, 0.0)
            })
            .collect();
        wrap_document(width, PANEL_HEIGHT, &body)
    }
}

impl Default for SvgReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), BandtraderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    info!("Chart written to {}", path.display());
    Ok(())
}

impl ReportPort for SvgReportAdapter {
    fn write_returns(
        &self,
        report: &EvaluationReport,
        output_path: &Path,
    ) -> Result<(), BandtraderError> {
        write_file(output_path, &self.render_returns(report))
    }

    fn write_prices(&self, series: &[PriceSeries], output_path: &Path) -> Result<(), BandtraderError> {
        write_file(output_path, &self.render_prices(series))
    }
}

fn format_ratio(ratio: f64) -> String {
    if ratio == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:.2}", ratio)
    }
}

fn summary_row(label: &str, summary: &PerformanceSummary) -> String {
    format!(
        "{:<10} {:>14.2} {:>16.2} {:>10}",
        label,
        summary.annual_return,
        summary.annual_downside_deviation,
        format_ratio(summary.risk_adjusted_ratio)
    )
}

/// Plain-text summary table for console output.
pub fn format_summary(report: &EvaluationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} ({} bars, {} to {}) ===\n",
        report.symbol(),
        report.series.len(),
        report.series.first_timestamp().format("%Y-%m-%d"),
        report.series.last_timestamp().format("%Y-%m-%d")
    ));
    out.push_str(&format!(
        "Bands: {}  risk-free rate: {}\n",
        report.bands.params, report.params.risk_free_rate
    ));
    out.push_str(&format!(
        "Signals: {} long, {} short, {} flat\n",
        report.signals.long, report.signals.short, report.signals.flat
    ));
    out.push_str(&format!(
        "{:<10} {:>14} {:>16} {:>10}\n",
        "", "annual return", "downside dev", "sortino"
    ));
    out.push_str(&summary_row("market", &report.market));
    out.push('\n');
    out.push_str(&summary_row("strategy", &report.strategy));
    out.push('\n');
    out
}
