//! Portfolio aggregation module.
//!
//! Combines per-asset returns and weights into portfolio returns, compounds
//! them into cumulative returns and converts rates between periods.

mod aggregate;
mod performance;

pub(crate) use aggregate::check_alignment;
pub use aggregate::{
    cumulative_returns, cumulative_returns_batch, portfolio_returns, wealth_index,
};
pub use performance::{annual_to_daily_rate, daily_to_annual_rate, TRADING_DAYS_PER_YEAR};
