//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::binance_adapter::{BinanceAdapter, DEFAULT_BASE_URL};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_report::{SvgReportAdapter, format_summary};
use crate::domain::config_validation::{
    build_fetch_request, build_params, validate_evaluation_config,
};
use crate::domain::error::BandtraderError;
use crate::domain::evaluation::evaluate_many;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_SYMBOL: &str = "BTCUSDT";

#[derive(Parser, Debug)]
#[command(
    name = "bandtrader",
    about = "Bollinger band reversal strategy evaluator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Data source and fetch window flags shared by the data commands. Each one
/// overrides the matching config key.
#[derive(Args, Debug, Default, Clone)]
pub struct DataArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// binance or csv
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub csv_path: Option<PathBuf>,
    #[arg(long)]
    pub base_url: Option<String>,
    /// Comma-separated symbols
    #[arg(long)]
    pub symbols: Option<String>,
    #[arg(long)]
    pub interval: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
    /// Drop bars on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the band strategy against buy-and-hold
    Evaluate {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        num_std: Option<f64>,
        #[arg(long)]
        risk_free_rate: Option<f64>,
        /// Directory for the SVG charts
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_chart: bool,
    },
    /// Chart raw close prices, one panel per symbol
    Prices {
        #[command(flatten)]
        data: DataArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List tradable symbols from the data source
    ListSymbols {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Evaluate {
            data,
            window,
            num_std,
            risk_free_rate,
            output,
            no_chart,
        } => load_settings(&data).and_then(|mut config| {
            if let Some(w) = window {
                config.set("evaluation", "window", w);
            }
            if let Some(n) = num_std {
                config.set("evaluation", "num_std", n);
            }
            if let Some(r) = risk_free_rate {
                config.set("evaluation", "risk_free_rate", r);
            }
            if let Some(o) = &output {
                config.set("report", "output_dir", o.display());
            }
            validate_evaluation_config(&config)?;
            run_evaluate(&config, no_chart)
        }),
        Command::Prices { data, output } => load_settings(&data).and_then(|mut config| {
            if let Some(o) = &output {
                config.set("report", "output_dir", o.display());
            }
            run_prices(&config)
        }),
        Command::ListSymbols { data } => load_settings(&data).and_then(|c| run_list_symbols(&c)),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load the config file (if any) and layer the command-line flags on top.
pub fn load_settings(args: &DataArgs) -> Result<FileConfigAdapter, BandtraderError> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)?
        }
        None => FileConfigAdapter::empty(),
    };

    if let Some(v) = &args.source {
        config.set("data", "source", v);
    }
    if let Some(v) = &args.csv_path {
        config.set("data", "csv_path", v.display());
    }
    if let Some(v) = &args.base_url {
        config.set("data", "base_url", v);
    }
    if let Some(v) = &args.symbols {
        config.set("evaluation", "symbols", v);
    }
    if let Some(v) = &args.interval {
        config.set("evaluation", "interval", v);
    }
    if let Some(v) = args.limit {
        config.set("evaluation", "limit", v);
    }
    if let Some(v) = &args.end_date {
        config.set("evaluation", "end_date", v);
    }

    validate_evaluation_config(&config)?;
    Ok(config)
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, BandtraderError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "binance".to_string())
        .to_lowercase();

    match source.as_str() {
        "csv" => {
            let path = config
                .get_string("data", "csv_path")
                .ok_or_else(|| BandtraderError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_path".into(),
                })?;
            info!("Reading prices from CSV files in {}", path);
            Ok(Box::new(CsvAdapter::new(PathBuf::from(path))))
        }
        _ => {
            let adapter = BinanceAdapter::from_config(config)?;
            info!(
                "Fetching prices from {}",
                config
                    .get_string("data", "base_url")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            );
            Ok(Box::new(adapter))
        }
    }
}

pub fn resolve_symbols(config: &dyn ConfigPort) -> Vec<String> {
    let symbols = config.get_list("evaluation", "symbols");
    if symbols.is_empty() {
        vec![DEFAULT_SYMBOL.to_string()]
    } else {
        symbols
    }
}

fn output_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("report", "output_dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn run_evaluate(config: &FileConfigAdapter, no_chart: bool) -> Result<(), BandtraderError> {
    let data_port = build_data_port(config)?;
    run_evaluation_pipeline(data_port.as_ref(), config, no_chart)
}

/// Evaluate every configured symbol, print each summary, and write charts.
/// All symbols are attempted; the first failure is returned afterwards.
pub fn run_evaluation_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    no_chart: bool,
) -> Result<(), BandtraderError> {
    let params = build_params(config);
    let request = build_fetch_request(config)?;
    let symbols = resolve_symbols(config);
    let out_dir = output_dir(config);
    let reporter = SvgReportAdapter::new();

    let mut first_error = None;
    for (symbol, result) in evaluate_many(data_port, &symbols, &request, &params) {
        match result {
            Ok(report) => {
                println!("{}", format_summary(&report));
                if !no_chart {
                    let path = chart_path(&out_dir, &symbol, "returns");
                    reporter.write_returns(&report, &path)?;
                }
            }
            Err(e) => {
                eprintln!("error: {symbol}: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub fn chart_path(dir: &Path, symbol: &str, kind: &str) -> PathBuf {
    dir.join(format!("{}_{}.svg", symbol.to_lowercase(), kind))
}

fn run_prices(config: &FileConfigAdapter) -> Result<(), BandtraderError> {
    let data_port = build_data_port(config)?;
    let request = build_fetch_request(config)?;
    let symbols = resolve_symbols(config);

    let series = symbols
        .iter()
        .map(|s| data_port.fetch_series(&request.with_symbol(s)))
        .collect::<Result<Vec<_>, _>>()?;

    let path = output_dir(config).join("prices.svg");
    SvgReportAdapter::new().write_prices(&series, &path)?;
    println!("{}", path.display());
    Ok(())
}

fn run_list_symbols(config: &FileConfigAdapter) -> Result<(), BandtraderError> {
    let data_port = build_data_port(config)?;
    let symbols = data_port.list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        info!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), BandtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = FileConfigAdapter::from_file(config_path)?;
    validate_evaluation_config(&config)?;

    let params = build_params(&config);
    let request = build_fetch_request(&config)?;
    eprintln!("  symbols:   {}", resolve_symbols(&config).join(", "));
    eprintln!("  interval:  {}", request.interval);
    eprintln!("  limit:     {}", request.limit);
    match request.end_exclusive {
        Some(d) => eprintln!("  end date:  {} (exclusive)", d),
        None => eprintln!("  end date:  none"),
    }
    eprintln!("  window:    {}", params.window);
    eprintln!("  num_std:   {}", params.num_std);
    eprintln!("  risk-free: {}", params.risk_free_rate);
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_evaluate_flags() {
        let cli = Cli::try_parse_from([
            "bandtrader",
            "evaluate",
            "--symbols",
            "BTCUSDT,ETHUSDT",
            "--interval",
            "4h",
            "--window",
            "10",
            "--num-std",
            "1.5",
            "--no-chart",
        ])
        .unwrap();

        match cli.command {
            Command::Evaluate {
                data,
                window,
                num_std,
                no_chart,
                ..
            } => {
                assert_eq!(data.symbols.as_deref(), Some("BTCUSDT,ETHUSDT"));
                assert_eq!(data.interval.as_deref(), Some("4h"));
                assert_eq!(window, Some(10));
                assert_eq!(num_std, Some(1.5));
                assert!(no_chart);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_requires_config_for_validate() {
        assert!(Cli::try_parse_from(["bandtrader", "validate"]).is_err());
    }

    #[test]
    fn load_settings_applies_flag_overrides() {
        let args = DataArgs {
            source: Some("csv".into()),
            csv_path: Some(PathBuf::from("/tmp/prices")),
            symbols: Some("ethusdt".into()),
            limit: Some(100),
            ..DataArgs::default()
        };
        let config = load_settings(&args).unwrap();
        assert_eq!(config.get_string("data", "source"), Some("csv".into()));
        assert_eq!(resolve_symbols(&config), vec!["ETHUSDT".to_string()]);
        assert_eq!(config.get_int("evaluation", "limit", 0), 100);
    }

    #[test]
    fn load_settings_rejects_invalid_flag() {
        let args = DataArgs {
            interval: Some("7d".into()),
            ..DataArgs::default()
        };
        assert!(matches!(
            load_settings(&args),
            Err(BandtraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn resolve_symbols_defaults_to_btc() {
        assert_eq!(
            resolve_symbols(&FileConfigAdapter::empty()),
            vec![DEFAULT_SYMBOL.to_string()]
        );
    }

    #[test]
    fn chart_path_is_lowercase() {
        assert_eq!(
            chart_path(Path::new("out"), "BTCUSDT", "returns"),
            PathBuf::from("out/btcusdt_returns.svg")
        );
    }
}
