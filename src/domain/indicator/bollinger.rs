//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n closes
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1), the same
//! convention the performance scorer uses for downside deviation.
//!
//! Warmup: first (window-1) bars have no band.

use crate::domain::error::BandtraderError;
use crate::domain::indicator::stddev::{mean, sample_std_dev};
use crate::domain::indicator::{BandParams, BandPoint, BandSet};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_bollinger(
    series: &PriceSeries,
    window: usize,
    num_std: f64,
) -> Result<BandSet, BandtraderError> {
    if window < 2 {
        return Err(BandtraderError::invalid_param(
            "window",
            "window must be at least 2 for a sample standard deviation",
        ));
    }
    if !num_std.is_finite() || num_std < 0.0 {
        return Err(BandtraderError::invalid_param(
            "num_std",
            "num_std must be a non-negative finite number",
        ));
    }
    if series.len() < window {
        return Err(BandtraderError::InsufficientData {
            symbol: series.symbol().to_string(),
            bars: series.len(),
            minimum: window,
        });
    }

    let closes = series.closes();
    let warmup = window - 1;

    let points = (0..closes.len())
        .map(|i| {
            if i < warmup {
                return None;
            }
            let slice = &closes[i + 1 - window..=i];
            let moving_average = mean(slice)?;
            let std_dev = sample_std_dev(slice)?;
            Some(BandPoint {
                moving_average,
                std_dev,
                upper: moving_average + num_std * std_dev,
                lower: moving_average - num_std * std_dev,
            })
        })
        .collect();

    Ok(BandSet {
        params: BandParams { window, num_std },
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn bollinger_warmup() {
        let series = make_series(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let bands = calculate_bollinger(&series, 3, 2.0).unwrap();

        assert_eq!(bands.len(), 5);
        assert!(bands.points[0].is_none());
        assert!(bands.points[1].is_none());
        assert!(bands.points[2].is_some());
        assert!(bands.points[3].is_some());
        assert!(bands.points[4].is_some());
    }

    #[test]
    fn bollinger_constant_values() {
        let series = make_series(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        let bands = calculate_bollinger(&series, 3, 2.0).unwrap();

        let p = bands.get(2).unwrap();
        assert_abs_diff_eq!(p.moving_average, 100.0);
        assert_abs_diff_eq!(p.upper, 100.0);
        assert_abs_diff_eq!(p.lower, 100.0);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let series = make_series(&[10.0, 20.0, 30.0]);
        let bands = calculate_bollinger(&series, 3, 2.0).unwrap();

        // mean 20, sample variance (100 + 0 + 100) / 2 = 100
        let p = bands.get(2).unwrap();
        assert_abs_diff_eq!(p.moving_average, 20.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p.std_dev, 10.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p.upper, 40.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p.lower, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_declining_series() {
        let series = make_series(&[100.0, 95.0, 90.0, 85.0, 80.0]);
        let bands = calculate_bollinger(&series, 3, 2.0).unwrap();

        let p = bands.get(2).unwrap();
        assert_abs_diff_eq!(p.moving_average, 95.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p.std_dev, 5.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p.lower, 85.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p.upper, 105.0, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_multiplier_variations() {
        let series = make_series(&[10.0, 20.0, 30.0]);
        let bands = calculate_bollinger(&series, 3, 1.0).unwrap();

        let p = bands.get(2).unwrap();
        assert_abs_diff_eq!(p.upper, 30.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p.lower, 10.0, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_symmetry() {
        let series = make_series(&[10.0, 12.0, 17.0, 11.0]);
        let bands = calculate_bollinger(&series, 3, 2.0).unwrap();

        for p in bands.points.iter().flatten() {
            assert_abs_diff_eq!(
                p.upper - p.moving_average,
                p.moving_average - p.lower,
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn bollinger_params_recorded() {
        let series = make_series(&[10.0, 20.0, 30.0]);
        let bands = calculate_bollinger(&series, 2, 1.5).unwrap();
        assert_eq!(
            bands.params,
            BandParams {
                window: 2,
                num_std: 1.5
            }
        );
    }

    #[test]
    fn bollinger_insufficient_data() {
        let series = make_series(&[10.0, 20.0]);
        let err = calculate_bollinger(&series, 3, 2.0).unwrap_err();
        assert!(matches!(
            err,
            BandtraderError::InsufficientData {
                bars: 2,
                minimum: 3,
                ..
            }
        ));
    }

    #[test]
    fn bollinger_window_exactly_series_length() {
        let series = make_series(&[10.0, 20.0, 30.0]);
        let bands = calculate_bollinger(&series, 3, 2.0).unwrap();
        assert_eq!(bands.defined_count(), 1);
    }

    #[test]
    fn bollinger_rejects_window_below_two() {
        let series = make_series(&[10.0, 20.0, 30.0]);
        assert!(matches!(
            calculate_bollinger(&series, 1, 2.0),
            Err(BandtraderError::InvalidParameter { .. })
        ));
        assert!(matches!(
            calculate_bollinger(&series, 0, 2.0),
            Err(BandtraderError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn bollinger_rejects_negative_multiplier() {
        let series = make_series(&[10.0, 20.0, 30.0]);
        assert!(matches!(
            calculate_bollinger(&series, 2, -1.0),
            Err(BandtraderError::InvalidParameter { .. })
        ));
        assert!(matches!(
            calculate_bollinger(&series, 2, f64::NAN),
            Err(BandtraderError::InvalidParameter { .. })
        ));
    }

    proptest! {
        #[test]
        fn moving_average_is_window_mean(
            closes in prop::collection::vec(1.0f64..1000.0, 2..60),
            window in 2usize..10,
        ) {
            prop_assume!(closes.len() >= window);
            let series = make_series(&closes);
            let bands = calculate_bollinger(&series, window, 2.0).unwrap();

            for (i, point) in bands.points.iter().enumerate() {
                if i + 1 < window {
                    prop_assert!(point.is_none());
                } else {
                    let expected = closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                    let p = point.unwrap();
                    prop_assert!((p.moving_average - expected).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn bands_are_ordered(
            closes in prop::collection::vec(1.0f64..1000.0, 2..60),
            window in 2usize..10,
            num_std in 0.0f64..4.0,
        ) {
            prop_assume!(closes.len() >= window);
            let series = make_series(&closes);
            let bands = calculate_bollinger(&series, window, num_std).unwrap();

            for p in bands.points.iter().flatten() {
                prop_assert!(p.std_dev >= 0.0);
                prop_assert!(p.lower <= p.moving_average);
                prop_assert!(p.moving_average <= p.upper);
            }
        }
    }
}
