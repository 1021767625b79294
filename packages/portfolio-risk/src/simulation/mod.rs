//! Monte Carlo projection of portfolio returns.
//!
//! Simulated paths are drawn from a normal distribution fitted to the
//! historical portfolio returns. Forward VaR/CVaR, per-day projection bands
//! and display sample paths are derived from the ensemble.

mod bands;
mod monte_carlo;

pub use bands::{projection_bands, sample_paths, ProjectionBand};
pub use monte_carlo::{monte_carlo_var, simulate_future_returns, SimulationConfig};
