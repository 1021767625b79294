//! Portfolio return aggregation and compounding.

use crate::types::{CumulativeReturnSeries, PortfolioReturnSeries, ReturnsMatrix, WeightVector};
use crate::{Error, Result};

/// Weighted portfolio return per date: `Σ_i w_i · r[t][i]`.
///
/// Weights must be paired with the matrix columns in the same order. They are
/// not required to sum to 1 here.
pub fn portfolio_returns(
    matrix: &ReturnsMatrix,
    weights: &WeightVector,
) -> Result<PortfolioReturnSeries> {
    check_alignment(matrix, weights)?;

    let mut returns = vec![0.0; matrix.n_rows()];
    for (column, w) in matrix.columns().iter().zip(weights.weights()) {
        for (acc, r) in returns.iter_mut().zip(column) {
            *acc += w * r;
        }
    }

    PortfolioReturnSeries::new(matrix.dates().to_vec(), returns)
}

pub(crate) fn check_alignment(matrix: &ReturnsMatrix, weights: &WeightVector) -> Result<()> {
    if weights.len() != matrix.n_assets() {
        return Err(Error::DimensionMismatch {
            expected: matrix.n_assets(),
            actual: weights.len(),
        });
    }
    for (index, (expected, actual)) in matrix.assets().iter().zip(weights.assets()).enumerate() {
        if expected != actual {
            return Err(Error::AssetMismatch {
                index,
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
    }
    Ok(())
}

/// Compound daily returns: `c[t] = Π_{k<=t}(1 + r[k]) - 1`.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    wealth_index(returns).into_iter().map(|w| w - 1.0).collect()
}

/// Growth of one unit of wealth: `W[t] = Π_{k<=t}(1 + r[k])`.
pub fn wealth_index(returns: &[f64]) -> Vec<f64> {
    let mut wealth = 1.0;
    returns
        .iter()
        .map(|r| {
            wealth *= 1.0 + r;
            wealth
        })
        .collect()
}

/// Compound each row of a batch of return paths sharing one time axis.
pub fn cumulative_returns_batch(paths: &[Vec<f64>]) -> Vec<Vec<f64>> {
    paths.iter().map(|path| cumulative_returns(path)).collect()
}

impl PortfolioReturnSeries {
    /// Cumulative returns on the same date index.
    pub fn cumulative(&self) -> CumulativeReturnSeries {
        // Lengths match by construction.
        Self::from_parts(self.dates().to_vec(), cumulative_returns(self.values()))
    }
}
