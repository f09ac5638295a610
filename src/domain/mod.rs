//! Core domain types and the evaluation pipeline.

pub mod ohlcv;
pub mod interval;
pub mod indicator;
pub mod signal;
pub mod returns;
pub mod metrics;
pub mod evaluation;
pub mod config_validation;
pub mod error;
