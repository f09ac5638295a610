//! Configuration validation.
//!
//! Validates every config field before an evaluation runs, and builds the
//! typed settings the pipeline consumes.

use crate::domain::error::BandtraderError;
use crate::domain::evaluation::EvaluationParams;
use crate::domain::interval::Interval;
use crate::domain::metrics::DEFAULT_RISK_FREE_RATE;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{FetchRequest, MAX_LIMIT};
use chrono::NaiveDate;
use std::str::FromStr;

pub const SOURCES: [&str; 2] = ["binance", "csv"];

/// Upper bound on HTTP retries; the backoff doubles per attempt.
pub const MAX_RETRIES: i64 = 10;

pub fn validate_evaluation_config(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    validate_source(config)?;
    validate_data_limits(config)?;
    validate_interval(config)?;
    validate_limit(config)?;
    validate_end_date(config)?;
    validate_window(config)?;
    validate_num_std(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BandtraderError {
    BandtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse a numeric key. Absent or blank is `None`; present but unparseable
/// is `ConfigInvalid` rather than a silent fallback to the default.
fn parse_number<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, BandtraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{}' is not a valid number", s.trim()))),
    }
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| SOURCES[0].to_string());
    if !SOURCES.contains(&source.trim().to_lowercase().as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown source '{}', expected one of {}", source, SOURCES.join(", ")),
        ));
    }
    if source.trim().eq_ignore_ascii_case("csv") && config.get_string("data", "csv_path").is_none()
    {
        return Err(BandtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "csv_path".to_string(),
        });
    }
    Ok(())
}

fn validate_data_limits(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    if let Some(secs) = parse_number::<i64>(config, "data", "timeout_secs")? {
        if secs < 1 {
            return Err(invalid("data", "timeout_secs", "timeout_secs must be at least 1"));
        }
    }
    if let Some(retries) = parse_number::<i64>(config, "data", "max_retries")? {
        if !(0..=MAX_RETRIES).contains(&retries) {
            return Err(invalid(
                "data",
                "max_retries",
                format!("max_retries must be between 0 and {}", MAX_RETRIES),
            ));
        }
    }
    Ok(())
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    if let Some(value) = config.get_string("evaluation", "interval") {
        value
            .parse::<Interval>()
            .map_err(|e| invalid("evaluation", "interval", e.to_string()))?;
    }
    Ok(())
}

fn validate_limit(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    let value = parse_number::<i64>(config, "evaluation", "limit")?.unwrap_or(MAX_LIMIT as i64);
    if value < 1 || value > MAX_LIMIT as i64 {
        return Err(invalid(
            "evaluation",
            "limit",
            format!("limit must be between 1 and {}", MAX_LIMIT),
        ));
    }
    Ok(())
}

fn validate_end_date(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    parse_end_date(config).map(|_| ())
}

fn parse_end_date(config: &dyn ConfigPort) -> Result<Option<NaiveDate>, BandtraderError> {
    match config.get_string("evaluation", "end_date") {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "evaluation",
                    "end_date",
                    "invalid end_date format, expected YYYY-MM-DD",
                )
            }),
    }
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    let value = parse_number::<i64>(config, "evaluation", "window")?.unwrap_or(20);
    if value < 2 {
        return Err(invalid("evaluation", "window", "window must be at least 2"));
    }
    Ok(())
}

fn validate_num_std(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    let value = parse_number::<f64>(config, "evaluation", "num_std")?.unwrap_or(2.0);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "evaluation",
            "num_std",
            "num_std must be non-negative",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    let value = parse_number::<f64>(config, "evaluation", "risk_free_rate")?
        .unwrap_or(DEFAULT_RISK_FREE_RATE);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "evaluation",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

/// Build evaluation parameters, assuming the config already validated.
pub fn build_params(config: &dyn ConfigPort) -> EvaluationParams {
    let defaults = EvaluationParams::default();
    EvaluationParams {
        window: config.get_int("evaluation", "window", defaults.window as i64).max(0) as usize,
        num_std: config.get_double("evaluation", "num_std", defaults.num_std),
        risk_free_rate: config.get_double("evaluation", "risk_free_rate", defaults.risk_free_rate),
    }
}

/// Build the fetch template shared by every configured symbol.
pub fn build_fetch_request(config: &dyn ConfigPort) -> Result<FetchRequest, BandtraderError> {
    let interval = match config.get_string("evaluation", "interval") {
        Some(value) => value
            .parse::<Interval>()
            .map_err(|e| invalid("evaluation", "interval", e.to_string()))?,
        None => Interval::default(),
    };
    Ok(FetchRequest {
        symbol: String::new(),
        interval,
        limit: config
            .get_int("evaluation", "limit", MAX_LIMIT as i64)
            .clamp(1, MAX_LIMIT as i64) as usize,
        end_exclusive: parse_end_date(config)?,
    })
}
