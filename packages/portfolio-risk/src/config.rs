//! Analysis configuration.

use crate::risk::{RiskParameters, VarMethod};
use crate::simulation::SimulationConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tunable constants of an analysis run.
///
/// Every key is optional in the TOML file; absent keys keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub confidence_level: f64,
    /// "historical" or "parametric"
    pub var_method: String,
    pub num_simulations: usize,
    pub horizon_days: usize,
    /// Lower edge of the projection band, in percent
    pub lower_percentile: f64,
    /// Upper edge of the projection band, in percent
    pub upper_percentile: f64,
    pub trading_days_per_year: usize,
    /// Number of simulated paths kept for display
    pub sample_paths: usize,
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            var_method: VarMethod::Historical.to_string(),
            num_simulations: 10_000,
            horizon_days: 252,
            lower_percentile: 5.0,
            upper_percentile: 95.0,
            trading_days_per_year: 252,
            sample_paths: 3,
            seed: None,
        }
    }
}

impl AnalysisConfig {
    /// Get the default config file path.
    ///
    /// Default path: `<config dir>/portfolio-risk/config.toml`
    /// Can be overridden with `PORTFOLIO_RISK_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("PORTFOLIO_RISK_CONFIG") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("portfolio-risk/config.toml"))
            .unwrap_or_else(|| PathBuf::from("portfolio-risk.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::default_path())
    }

    /// Load and validate a config file. A missing file yields the defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside their domain.
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(Error::InvalidConfidenceLevel(self.confidence_level));
        }
        self.var_method()?;
        if self.num_simulations == 0 {
            return Err(Error::InvalidInput(
                "num_simulations must be positive".to_string(),
            ));
        }
        if self.horizon_days == 0 {
            return Err(Error::InvalidInput("horizon_days must be positive".to_string()));
        }
        if self.trading_days_per_year == 0 {
            return Err(Error::InvalidInput(
                "trading_days_per_year must be positive".to_string(),
            ));
        }

        let in_range = |p: f64| (0.0..=100.0).contains(&p);
        if !in_range(self.lower_percentile)
            || !in_range(self.upper_percentile)
            || self.lower_percentile > self.upper_percentile
        {
            return Err(Error::InvalidInput(format!(
                "projection percentiles must satisfy 0 <= lower <= upper <= 100, got {} / {}",
                self.lower_percentile, self.upper_percentile
            )));
        }
        Ok(())
    }

    /// Parsed VaR method.
    pub fn var_method(&self) -> Result<VarMethod> {
        self.var_method.parse()
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            num_simulations: self.num_simulations,
            horizon_days: self.horizon_days,
            confidence_level: self.confidence_level,
            seed: self.seed,
        }
    }

    /// Risk report parameters for a daily target rate.
    pub fn risk_parameters(&self, target_rate: f64) -> Result<RiskParameters> {
        Ok(RiskParameters {
            confidence_level: self.confidence_level,
            var_method: self.var_method()?,
            target_rate,
            periods_per_year: self.trading_days_per_year,
        })
    }
}
