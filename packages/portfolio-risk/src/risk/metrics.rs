//! Portfolio risk metrics calculation.
//!
//! Provides VaR, CVaR, Sharpe ratio, Sortino ratio and drawdown calculations
//! over daily returns. Every function is pure; undefined results are reported
//! as [`Error::UndefinedMetric`] rather than NaN or infinity.

use super::stats::{mean, norm_ppf, percentile, sample_std, Interpolation};
use crate::portfolio::wealth_index;
use crate::types::{DrawdownSeries, PortfolioReturnSeries, TailRisk};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Method used to estimate Value at Risk.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VarMethod {
    /// Empirical percentile of the observed returns
    #[default]
    Historical,
    /// Normal approximation from the sample mean and standard deviation
    Parametric,
}

impl FromStr for VarMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "historical" => Ok(VarMethod::Historical),
            "parametric" => Ok(VarMethod::Parametric),
            other => Err(Error::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for VarMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarMethod::Historical => write!(f, "historical"),
            VarMethod::Parametric => write!(f, "parametric"),
        }
    }
}

fn check_confidence(confidence: f64) -> Result<()> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfidenceLevel(confidence))
    }
}

fn check_sample(returns: &[f64]) -> Result<()> {
    if returns.is_empty() {
        return Err(Error::UndefinedMetric("return sample is empty".to_string()));
    }
    if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "return sample contains a non-finite value: {}",
            bad
        )));
    }
    Ok(())
}

/// Calculate Value at Risk as a daily return at the given confidence level.
///
/// # Arguments
///
/// * `returns` - Daily returns (e.g., 0.01 for 1%)
/// * `confidence` - Confidence level in (0, 1), typically 0.95
/// * `method` - Historical percentile or parametric normal estimate
///
/// # Returns
///
/// The return threshold below which the worst `1 - confidence` share of
/// outcomes fall; negative values are losses.
///
/// The historical estimate is the `(1 - confidence)` empirical percentile,
/// taking the lower observation when the percentile falls between two. With
/// five observations at 95% that is the minimum.
///
/// The parametric estimate is `mean + z(1 - confidence) · std`, i.e. the
/// `1 - confidence` quantile of a normal fitted to the sample.
pub fn value_at_risk(returns: &[f64], confidence: f64, method: VarMethod) -> Result<f64> {
    check_confidence(confidence)?;
    check_sample(returns)?;

    match method {
        VarMethod::Historical => Ok(percentile(
            returns,
            (1.0 - confidence) * 100.0,
            Interpolation::Lower,
        )),
        VarMethod::Parametric => {
            let std = sample_std(returns);
            if !std.is_finite() {
                return Err(Error::UndefinedMetric(
                    "parametric VaR needs at least two returns".to_string(),
                ));
            }
            Ok(mean(returns) + norm_ppf(1.0 - confidence) * std)
        }
    }
}

/// Calculate Conditional VaR (expected shortfall).
///
/// Mean of every return at or below the historical VaR.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> Result<f64> {
    let var = value_at_risk(returns, confidence, VarMethod::Historical)?;

    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    if tail.is_empty() {
        return Err(Error::UndefinedMetric(format!(
            "no returns at or below VaR {}",
            var
        )));
    }
    Ok(mean(&tail))
}

/// Historical VaR and CVaR in one pass.
pub fn tail_risk(returns: &[f64], confidence: f64) -> Result<TailRisk> {
    Ok(TailRisk {
        var: value_at_risk(returns, confidence, VarMethod::Historical)?,
        cvar: conditional_value_at_risk(returns, confidence)?,
    })
}

/// Calculate the Sharpe ratio from daily returns.
///
/// # Arguments
///
/// * `returns` - Daily returns
/// * `target_rate` - Daily target rate (convert annual rates first)
///
/// # Returns
///
/// `mean(excess) / std(excess)`, not annualized.
pub fn sharpe_ratio(returns: &[f64], target_rate: f64) -> Result<f64> {
    check_sample(returns)?;

    let excess: Vec<f64> = returns.iter().map(|r| r - target_rate).collect();
    let std = sample_std(&excess);

    if !std.is_finite() {
        return Err(Error::UndefinedMetric(
            "Sharpe ratio needs at least two returns".to_string(),
        ));
    }
    if std == 0.0 {
        return Err(Error::UndefinedMetric(
            "Sharpe ratio is undefined for zero volatility".to_string(),
        ));
    }

    Ok(mean(&excess) / std)
}

/// Calculate the Sortino ratio from daily returns.
///
/// Same numerator as Sharpe; the denominator is the downside deviation
/// `sqrt(mean(min(excess, 0)^2))`.
pub fn sortino_ratio(returns: &[f64], target_rate: f64) -> Result<f64> {
    check_sample(returns)?;

    let excess: Vec<f64> = returns.iter().map(|r| r - target_rate).collect();
    let downside: Vec<f64> = excess.iter().map(|e| e.min(0.0).powi(2)).collect();
    let downside_risk = mean(&downside).sqrt();

    if downside_risk == 0.0 {
        return Err(Error::UndefinedMetric(
            "Sortino ratio is undefined: no returns below the target rate".to_string(),
        ));
    }

    Ok(mean(&excess) / downside_risk)
}

/// Calculate the drawdown at every date.
///
/// `(W[t] - max(W[0..=t])) / max(W[0..=t])` for the wealth curve
/// `W[t] = Π(1 + r)`. Values are <= 0 and start at 0.
///
/// Once wealth reaches zero or below (a return of -100% or worse, possible
/// with short positions) the portfolio is wiped out and every later drawdown
/// is -1.
pub fn drawdowns(returns: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    let mut wiped_out = false;
    wealth_index(returns)
        .into_iter()
        .map(|wealth| {
            wiped_out |= wealth <= 0.0;
            if wiped_out {
                return -1.0;
            }
            peak = peak.max(wealth);
            (wealth - peak) / peak
        })
        .collect()
}

/// Drawdowns on the date index of a portfolio return series.
pub fn drawdown_series(returns: &PortfolioReturnSeries) -> DrawdownSeries {
    DrawdownSeries::from_parts(returns.dates().to_vec(), drawdowns(returns.values()))
}

/// Deepest drawdown over the window (the minimum of [`drawdowns`]).
///
/// Returns 0.0 for an empty series.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    drawdowns(returns).into_iter().fold(0.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: [f64; 5] = [0.01, -0.02, 0.03, -0.01, 0.00];

    // Deterministic pseudo-returns for testing
    fn generate_returns(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 0.0005 + 0.02 * ((i as f64 * 1.7).sin() * (i as f64 * 0.3).cos()))
            .collect()
    }

    #[test]
    fn test_historical_var_small_sample() {
        let var = value_at_risk(&SAMPLE, 0.95, VarMethod::Historical).unwrap();
        assert_eq!(var, -0.02);

        let cvar = conditional_value_at_risk(&SAMPLE, 0.95).unwrap();
        assert_relative_eq!(cvar, -0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_historical_var_monotonic_in_confidence() {
        let returns = generate_returns(500);
        let mut previous = f64::INFINITY;
        for confidence in [0.5, 0.8, 0.9, 0.95, 0.975, 0.99, 0.999] {
            let var = value_at_risk(&returns, confidence, VarMethod::Historical).unwrap();
            assert!(var <= previous);
            previous = var;
        }
    }

    #[test]
    fn test_cvar_not_above_var() {
        let returns = generate_returns(250);
        let risk = tail_risk(&returns, 0.95).unwrap();
        assert!(risk.cvar <= risk.var);
    }

    #[test]
    fn test_parametric_var() {
        let returns = generate_returns(250);
        let var = value_at_risk(&returns, 0.95, VarMethod::Parametric).unwrap();

        let expected = mean(&returns) - 1.644853627 * sample_std(&returns);
        assert_relative_eq!(var, expected, epsilon = 1e-8);
        assert!(var < 0.0);
    }

    #[test]
    fn test_parametric_var_single_observation() {
        let result = value_at_risk(&[0.01], 0.95, VarMethod::Parametric);
        assert!(matches!(result, Err(Error::UndefinedMetric(_))));
    }

    #[test]
    fn test_var_method_from_str() {
        assert_eq!(
            "historical".parse::<VarMethod>().unwrap(),
            VarMethod::Historical
        );
        assert_eq!(
            "parametric".parse::<VarMethod>().unwrap(),
            VarMethod::Parametric
        );
        match "montecarlo".parse::<VarMethod>() {
            Err(Error::InvalidMethod(method)) => assert_eq!(method, "montecarlo"),
            other => panic!("expected InvalidMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_confidence_level() {
        for confidence in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let result = value_at_risk(&SAMPLE, confidence, VarMethod::Historical);
            assert!(matches!(result, Err(Error::InvalidConfidenceLevel(_))));
        }
    }

    #[test]
    fn test_var_empty_sample() {
        let result = value_at_risk(&[], 0.95, VarMethod::Historical);
        assert!(matches!(result, Err(Error::UndefinedMetric(_))));
        assert!(matches!(
            conditional_value_at_risk(&[], 0.95),
            Err(Error::UndefinedMetric(_))
        ));
    }

    #[test]
    fn test_var_rejects_nan_returns() {
        let result = value_at_risk(&[0.01, f64::NAN], 0.95, VarMethod::Historical);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_sharpe_ratio() {
        let sharpe = sharpe_ratio(&SAMPLE, 0.0).unwrap();
        // mean 0.002, sample std of SAMPLE
        let expected = 0.002 / sample_std(&SAMPLE);
        assert_relative_eq!(sharpe, expected, epsilon = 1e-12);

        // Target rate shifts only the numerator
        let shifted = sharpe_ratio(&SAMPLE, 0.001).unwrap();
        assert_relative_eq!(shifted, 0.001 / sample_std(&SAMPLE), epsilon = 1e-12);
    }

    #[test]
    fn test_sharpe_ratio_zero_volatility() {
        let flat = vec![0.0; 20];
        assert!(matches!(
            sharpe_ratio(&flat, 0.0),
            Err(Error::UndefinedMetric(_))
        ));
    }

    #[test]
    fn test_sortino_ratio() {
        let sortino = sortino_ratio(&SAMPLE, 0.0).unwrap();
        // Downside: sqrt((0.02^2 + 0.01^2) / 5) = sqrt(0.0001)
        assert_relative_eq!(sortino, 0.002 / 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_sortino_ratio_no_downside() {
        let all_positive = vec![0.01, 0.02, 0.0, 0.005];
        let result = sortino_ratio(&all_positive, 0.0);
        assert!(matches!(result, Err(Error::UndefinedMetric(_))));
    }

    #[test]
    fn test_drawdowns() {
        let returns = vec![0.10, 0.05, -0.15, -0.10, 0.05];
        let dd = drawdowns(&returns);

        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[1], 0.0); // new peak
        // Peak 1.155, trough 1.155 * 0.85 * 0.90
        assert_relative_eq!(dd[3], 0.85 * 0.90 - 1.0, epsilon = 1e-12);
        assert!(dd.iter().all(|d| *d <= 0.0));
        assert_relative_eq!(max_drawdown(&returns), 0.85 * 0.90 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_drawdown_first_date_is_zero_after_loss() {
        let dd = drawdowns(&[-0.05, -0.02, 0.10]);
        assert_eq!(dd[0], 0.0);
        assert_relative_eq!(dd[1], -0.02, epsilon = 1e-12);
        // 0.95 * 0.98 * 1.10 > 0.95, a new peak
        assert_eq!(dd[2], 0.0);
    }

    #[test]
    fn test_drawdown_after_wipeout_is_total_loss() {
        assert_eq!(drawdowns(&[-1.5, 1.0]), vec![-1.0, -1.0]);
        assert_eq!(drawdowns(&[0.05, -1.0, 0.1]), vec![0.0, -1.0, -1.0]);
        assert_eq!(max_drawdown(&[-1.0, 0.1]), -1.0);
    }

    #[test]
    fn test_drawdowns_never_positive() {
        let dd = drawdowns(&generate_returns(300));
        assert!(dd.iter().all(|d| *d <= 0.0));
    }

    #[test]
    fn test_max_drawdown_no_loss() {
        let returns = vec![0.01, 0.02, 0.03, 0.01, 0.02];
        assert_eq!(max_drawdown(&returns), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }
}
