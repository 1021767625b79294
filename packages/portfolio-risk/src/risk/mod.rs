//! Risk metrics module.
//!
//! Historical VaR/CVaR, Sharpe and Sortino ratios, drawdowns and per-asset
//! risk contribution, plus the statistics they are built on.

mod contribution;
mod metrics;
mod report;
mod stats;

pub use contribution::{covariance_matrix, risk_contributions};
pub use metrics::{
    conditional_value_at_risk, drawdown_series, drawdowns, max_drawdown, sharpe_ratio,
    sortino_ratio, tail_risk, value_at_risk, VarMethod,
};
pub use report::RiskParameters;
pub use stats::{mean, norm_ppf, percentile, sample_std, Interpolation};
