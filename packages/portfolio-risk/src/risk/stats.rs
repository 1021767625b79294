//! Sample statistics shared by the risk and simulation modules.

use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;

/// How a percentile falling between two observations is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Linear interpolation between the neighbouring order statistics
    Linear,
    /// The lower neighbouring observation, so the result is always an observed value
    Lower,
}

/// Arithmetic mean, NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Sample standard deviation (n - 1 denominator), NaN for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    values.iter().std_dev()
}

/// The `pct`-th percentile (0 to 100) of `values`.
///
/// Positions are taken on `(n - 1)`, so `pct = 0` is the minimum and
/// `pct = 100` the maximum. Returns NaN for an empty slice.
pub fn percentile(values: &[f64], pct: f64, interpolation: Interpolation) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, pct, interpolation)
}

/// Percentile of data that is already sorted ascending.
pub(crate) fn percentile_sorted(sorted: &[f64], pct: f64, interpolation: Interpolation) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let pos = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    match interpolation {
        Interpolation::Lower => sorted[lo],
        Interpolation::Linear => {
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Inverse cumulative distribution function of the standard normal distribution.
pub fn norm_ppf(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    match Normal::new(0.0, 1.0) {
        Ok(standard) => standard.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}
