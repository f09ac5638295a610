//! Sample standard deviation shared by the band indicator and the scorer.
//!
//! STDDEV(x) = sqrt(sum((x_i - mean)^2) / (n - 1))
//! Undefined (None) for fewer than two observations.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance: f64 = values
        .iter()
        .map(|v| {
            let diff = v - avg;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;

    Some(variance.sqrt())
}
