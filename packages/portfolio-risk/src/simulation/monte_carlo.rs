//! Path generation and forward tail risk.

use crate::portfolio::cumulative_returns_batch;
use crate::risk::{mean, sample_std, tail_risk};
use crate::types::{MonteCarloRisk, SimulationResult};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use tracing::debug;

/// Simulation parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Number of independent paths
    pub num_simulations: usize,
    /// Days simulated per path
    pub horizon_days: usize,
    /// Confidence level for forward VaR/CVaR
    pub confidence_level: f64,
    /// Master seed; drawn from entropy when absent
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_simulations: 10_000,
            horizon_days: 252,
            confidence_level: 0.95,
            seed: None,
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<()> {
        if self.num_simulations == 0 {
            return Err(Error::InvalidInput(
                "number of simulations must be positive".to_string(),
            ));
        }
        if self.horizon_days == 0 {
            return Err(Error::InvalidInput(
                "simulation horizon must be positive".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(Error::InvalidConfidenceLevel(self.confidence_level));
        }
        Ok(())
    }
}

/// Fitted daily-return distribution. A zero standard deviation yields
/// constant paths at the mean.
enum Fitted {
    Normal(Normal),
    Constant(f64),
}

impl Fitted {
    fn from_returns(returns: &[f64]) -> Result<Self> {
        if returns.is_empty() {
            return Err(Error::UndefinedMetric(
                "cannot fit a distribution to an empty return series".to_string(),
            ));
        }
        if let Some(bad) = returns.iter().find(|r| !r.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "return series contains a non-finite value: {}",
                bad
            )));
        }

        let mu = mean(returns);
        let sigma = sample_std(returns);
        if !sigma.is_finite() {
            return Err(Error::UndefinedMetric(
                "simulation needs at least two historical returns".to_string(),
            ));
        }
        if sigma == 0.0 {
            return Ok(Fitted::Constant(mu));
        }
        Normal::new(mu, sigma)
            .map(Fitted::Normal)
            .map_err(|e| Error::InvalidInput(format!("cannot fit normal distribution: {}", e)))
    }

    fn path(&self, seed: u64, horizon: usize) -> Vec<f64> {
        match self {
            Fitted::Normal(normal) => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..horizon).map(|_| rng.sample(normal)).collect()
            }
            Fitted::Constant(mu) => vec![*mu; horizon],
        }
    }
}

fn master_seed(config: &SimulationConfig) -> u64 {
    config.seed.unwrap_or_else(rand::random)
}

/// Draw `num_simulations × horizon_days` i.i.d. daily returns from a normal
/// fitted to the historical sample mean and standard deviation.
///
/// Every path gets its own generator seeded from the master seed, so a seeded
/// run is reproducible regardless of how rayon splits the work.
pub fn simulate_future_returns(returns: &[f64], config: &SimulationConfig) -> Result<Vec<Vec<f64>>> {
    config.validate()?;
    let fitted = Fitted::from_returns(returns)?;
    Ok(generate(&fitted, master_seed(config), config))
}

fn generate(fitted: &Fitted, seed: u64, config: &SimulationConfig) -> Vec<Vec<f64>> {
    let mut master = StdRng::seed_from_u64(seed);
    let seeds: Vec<u64> = (0..config.num_simulations).map(|_| master.gen()).collect();

    seeds
        .into_par_iter()
        .map(|path_seed| fitted.path(path_seed, config.horizon_days))
        .collect()
}

/// Simulate the ensemble and derive forward VaR/CVaR.
///
/// Daily figures use every simulated return; cumulative figures use each
/// path's compounded return on the final day.
pub fn monte_carlo_var(returns: &[f64], config: &SimulationConfig) -> Result<SimulationResult> {
    config.validate()?;
    let fitted = Fitted::from_returns(returns)?;
    let seed = master_seed(config);

    let daily_returns = generate(&fitted, seed, config);
    let cumulative = cumulative_returns_batch(&daily_returns);

    let grid: Vec<f64> = daily_returns.iter().flatten().copied().collect();
    let terminal: Vec<f64> = cumulative
        .iter()
        .filter_map(|path| path.last().copied())
        .collect();

    let risk = MonteCarloRisk {
        daily: tail_risk(&grid, config.confidence_level)?,
        cumulative: tail_risk(&terminal, config.confidence_level)?,
    };
    debug!(
        paths = config.num_simulations,
        horizon = config.horizon_days,
        seed,
        daily_var = risk.daily.var,
        cumulative_var = risk.cumulative.var,
        "monte carlo simulation complete"
    );

    Ok(SimulationResult {
        num_simulations: config.num_simulations,
        horizon_days: config.horizon_days,
        seed: Some(seed),
        daily_returns,
        cumulative_returns: cumulative,
        risk,
    })
}
