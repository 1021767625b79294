//! Per-asset decomposition of portfolio risk.

use crate::portfolio::check_alignment;
use crate::types::{ReturnsMatrix, RiskContribution, WeightVector};
use crate::{Error, Result};
use statrs::statistics::Statistics;

/// Sample covariance matrix of the asset return columns (n - 1 denominator).
pub fn covariance_matrix(matrix: &ReturnsMatrix) -> Result<Vec<Vec<f64>>> {
    if matrix.n_rows() < 2 {
        return Err(Error::UndefinedMetric(
            "covariance needs at least two dates".to_string(),
        ));
    }

    let columns = matrix.columns();
    let n = columns.len();
    let mut cov = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let c = columns[i].iter().covariance(columns[j].iter());
            cov[i][j] = c;
            cov[j][i] = c;
        }
    }
    Ok(cov)
}

/// Decompose portfolio volatility into per-asset contributions.
///
/// With covariance `Σ` and weights `w`, portfolio risk is `σ = sqrt(wᵀΣw)`:
///
/// - marginal contribution: `(Σw)_i / σ`
/// - total contribution: `marginal_i · w_i`
/// - normalized contribution: `total_i / σ`, summing to 1 across assets
///
/// # Errors
///
/// * `WeightsNotNormalized` - weights do not sum to 1 within 1e-8
/// * `DimensionMismatch` / `AssetMismatch` - weights not paired with the matrix columns
/// * `UndefinedMetric` - fewer than two dates, or zero portfolio variance
pub fn risk_contributions(
    matrix: &ReturnsMatrix,
    weights: &WeightVector,
) -> Result<Vec<RiskContribution>> {
    weights.ensure_normalized()?;
    check_alignment(matrix, weights)?;

    let cov = covariance_matrix(matrix)?;
    let w = weights.weights();

    let sigma_w: Vec<f64> = cov
        .iter()
        .map(|row| row.iter().zip(w).map(|(c, wj)| c * wj).sum())
        .collect();
    let variance: f64 = w.iter().zip(&sigma_w).map(|(wi, sw)| wi * sw).sum();

    if !(variance.is_finite() && variance > 0.0) {
        return Err(Error::UndefinedMetric(format!(
            "portfolio variance is {}, risk contribution needs positive risk",
            variance
        )));
    }
    let portfolio_risk = variance.sqrt();

    Ok(matrix
        .assets()
        .iter()
        .zip(w)
        .zip(&sigma_w)
        .map(|((asset, wi), sw)| {
            let marginal = sw / portfolio_risk;
            let total = marginal * wi;
            RiskContribution {
                asset: asset.clone(),
                marginal,
                total,
                normalized: total / portfolio_risk,
            }
        })
        .collect())
}
