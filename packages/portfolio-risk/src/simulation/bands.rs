//! Per-day summaries of a simulated ensemble.

use crate::risk::{percentile, Interpolation};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Lower, median and upper percentile of the cumulative ensemble per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionBand {
    pub lower_percentile: f64,
    pub upper_percentile: f64,
    pub lower: Vec<f64>,
    pub median: Vec<f64>,
    pub upper: Vec<f64>,
}

impl ProjectionBand {
    pub fn len(&self) -> usize {
        self.median.len()
    }

    pub fn is_empty(&self) -> bool {
        self.median.is_empty()
    }
}

/// Compute the projection band of a path ensemble (rows = paths, columns = days).
///
/// Percentiles are in `[0, 100]` and interpolated linearly between
/// neighbouring paths.
pub fn projection_bands(
    paths: &[Vec<f64>],
    lower_pct: f64,
    upper_pct: f64,
) -> Result<ProjectionBand> {
    let in_range = |p: f64| (0.0..=100.0).contains(&p);
    if !in_range(lower_pct) || !in_range(upper_pct) || lower_pct > upper_pct {
        return Err(Error::InvalidInput(format!(
            "invalid projection percentiles {} / {}",
            lower_pct, upper_pct
        )));
    }

    let horizon = match paths.first() {
        Some(first) => first.len(),
        None => {
            return Err(Error::EmptyResult(
                "no simulated paths to summarize".to_string(),
            ))
        }
    };
    if let Some(ragged) = paths.iter().find(|p| p.len() != horizon) {
        return Err(Error::DimensionMismatch {
            expected: horizon,
            actual: ragged.len(),
        });
    }

    let per_day: Vec<(f64, f64, f64)> = (0..horizon)
        .into_par_iter()
        .map(|day| {
            let column: Vec<f64> = paths.iter().map(|p| p[day]).collect();
            (
                percentile(&column, lower_pct, Interpolation::Linear),
                percentile(&column, 50.0, Interpolation::Linear),
                percentile(&column, upper_pct, Interpolation::Linear),
            )
        })
        .collect();

    let mut band = ProjectionBand {
        lower_percentile: lower_pct,
        upper_percentile: upper_pct,
        lower: Vec::with_capacity(horizon),
        median: Vec::with_capacity(horizon),
        upper: Vec::with_capacity(horizon),
    };
    for (lo, mid, hi) in per_day {
        band.lower.push(lo);
        band.median.push(mid);
        band.upper.push(hi);
    }
    Ok(band)
}

/// Pick up to `count` distinct paths for display.
pub fn sample_paths(paths: &[Vec<f64>], count: usize, seed: Option<u64>) -> Vec<Vec<f64>> {
    let amount = count.min(paths.len());
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    rand::seq::index::sample(&mut rng, paths.len(), amount)
        .into_iter()
        .map(|i| paths[i].clone())
        .collect()
}
