//! Assembly of the historical risk report.

use super::contribution::risk_contributions;
use super::metrics::{
    conditional_value_at_risk, drawdown_series, max_drawdown, sharpe_ratio, sortino_ratio,
    value_at_risk, VarMethod,
};
use crate::portfolio::{daily_to_annual_rate, TRADING_DAYS_PER_YEAR};
use crate::types::{
    MetricValue, PortfolioReturnSeries, ReturnsMatrix, RiskContributions, RiskReport,
    WeightVector,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inputs controlling the historical risk report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskParameters {
    /// Confidence level for VaR/CVaR
    pub confidence_level: f64,
    /// VaR estimation method
    pub var_method: VarMethod,
    /// Daily target rate for Sharpe/Sortino
    pub target_rate: f64,
    /// Periods per year used to annualize the target rate
    pub periods_per_year: usize,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            var_method: VarMethod::Historical,
            target_rate: 0.0,
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl RiskReport {
    /// Compute every historical risk figure for one analysis run.
    ///
    /// Metrics that are undefined for this sample (for example Sortino with no
    /// downside, or risk contribution with zero portfolio variance) are
    /// recorded as undefined values. Parameter and pairing errors are returned.
    pub fn build(
        matrix: &ReturnsMatrix,
        weights: &WeightVector,
        returns: &PortfolioReturnSeries,
        params: &RiskParameters,
    ) -> Result<Self> {
        let values = returns.values();

        let var = MetricValue::from_result(value_at_risk(
            values,
            params.confidence_level,
            params.var_method,
        ))?;
        let cvar =
            MetricValue::from_result(conditional_value_at_risk(values, params.confidence_level))?;
        let sharpe = MetricValue::from_result(sharpe_ratio(values, params.target_rate))?;
        let sortino = MetricValue::from_result(sortino_ratio(values, params.target_rate))?;
        let contributions = RiskContributions::from_result(risk_contributions(matrix, weights))?;

        debug!(
            var = ?var.value(),
            cvar = ?cvar.value(),
            sharpe = ?sharpe.value(),
            sortino = ?sortino.value(),
            "computed historical risk metrics"
        );

        Ok(Self {
            confidence_level: params.confidence_level,
            var_method: params.var_method.to_string(),
            var,
            cvar,
            sharpe_ratio: sharpe,
            sortino_ratio: sortino,
            target_rate_daily: params.target_rate,
            target_rate_annual: daily_to_annual_rate(params.target_rate, params.periods_per_year),
            drawdowns: drawdown_series(returns),
            max_drawdown: max_drawdown(values),
            risk_contributions: contributions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::portfolio_returns;
    use crate::types::parse_date;
    use crate::Error;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = parse_date("2023-01-02").unwrap();
        (0..n).map(|i| start + chrono::Days::new(i as u64)).collect()
    }

    fn fixture() -> (ReturnsMatrix, WeightVector) {
        let rows = vec![
            vec![0.012, 0.008],
            vec![-0.025, -0.015],
            vec![0.031, 0.029],
            vec![-0.009, -0.011],
            vec![0.004, -0.004],
        ];
        let assets: Vec<String> = vec!["AAPL".into(), "MSFT".into()];
        let matrix = ReturnsMatrix::from_rows(dates(5), assets.clone(), &rows).unwrap();
        let weights = WeightVector::new(assets, vec![0.5, 0.5]).unwrap();
        (matrix, weights)
    }

    #[test]
    fn test_build_report() {
        let (matrix, weights) = fixture();
        let returns = portfolio_returns(&matrix, &weights).unwrap();
        let report =
            RiskReport::build(&matrix, &weights, &returns, &RiskParameters::default()).unwrap();

        // Portfolio returns: [0.01, -0.02, 0.03, -0.01, 0.0]
        assert_relative_eq!(report.var.value().unwrap(), -0.02, epsilon = 1e-12);
        assert_relative_eq!(report.cvar.value().unwrap(), -0.02, epsilon = 1e-12);
        assert!(report.sharpe_ratio.is_defined());
        assert!(report.sortino_ratio.is_defined());
        assert_eq!(report.var_method, "historical");
        assert_eq!(report.drawdowns.len(), 5);
        assert!(report.max_drawdown < 0.0);
        let contributions = report.risk_contributions.as_slice().unwrap();
        assert_eq!(contributions.len(), 2);

        let normalized: f64 = contributions.iter().map(|c| c.normalized).sum();
        assert_relative_eq!(normalized, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_report_flags_undefined_sortino() {
        let (matrix, weights) = fixture();
        let returns = portfolio_returns(&matrix, &weights).unwrap();
        let params = RiskParameters {
            target_rate: -0.05,
            ..RiskParameters::default()
        };
        let report = RiskReport::build(&matrix, &weights, &returns, &params).unwrap();

        assert!(report.sharpe_ratio.is_defined());
        assert!(matches!(
            report.sortino_ratio,
            MetricValue::Undefined { .. }
        ));
    }

    #[test]
    fn test_report_annualizes_target_rate() {
        let (matrix, weights) = fixture();
        let returns = portfolio_returns(&matrix, &weights).unwrap();
        let params = RiskParameters {
            target_rate: 0.0002,
            ..RiskParameters::default()
        };
        let report = RiskReport::build(&matrix, &weights, &returns, &params).unwrap();

        assert_relative_eq!(
            report.target_rate_annual,
            1.0002_f64.powi(252) - 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_report_survives_zero_portfolio_variance() {
        let rows = vec![vec![0.5, 0.25], vec![0.5, 0.25], vec![0.5, 0.25]];
        let assets: Vec<String> = vec!["AAPL".into(), "MSFT".into()];
        let matrix = ReturnsMatrix::from_rows(dates(3), assets.clone(), &rows).unwrap();
        let weights = WeightVector::new(assets, vec![0.5, 0.5]).unwrap();
        let returns = portfolio_returns(&matrix, &weights).unwrap();

        let report =
            RiskReport::build(&matrix, &weights, &returns, &RiskParameters::default()).unwrap();

        assert!(matches!(
            report.risk_contributions,
            RiskContributions::Undefined { .. }
        ));
        assert_eq!(report.var.value(), Some(0.375));
        assert!(!report.sharpe_ratio.is_defined());
        assert_eq!(report.max_drawdown, 0.0);
    }

    #[test]
    fn test_report_with_unnormalized_weights() {
        let (matrix, _) = fixture();
        let weights = WeightVector::new(matrix.assets().to_vec(), vec![0.5, 0.25]).unwrap();
        let returns = portfolio_returns(&matrix, &weights).unwrap();

        let report =
            RiskReport::build(&matrix, &weights, &returns, &RiskParameters::default()).unwrap();

        assert!(!report.risk_contributions.is_defined());
        assert!(report.var.is_defined());
        assert!(report.cvar.is_defined());
    }

    #[test]
    fn test_report_rejects_bad_confidence() {
        let (matrix, weights) = fixture();
        let returns = portfolio_returns(&matrix, &weights).unwrap();
        let params = RiskParameters {
            confidence_level: 1.5,
            ..RiskParameters::default()
        };
        assert!(matches!(
            RiskReport::build(&matrix, &weights, &returns, &params),
            Err(Error::InvalidConfidenceLevel(_))
        ));
    }
}
