//! End-to-end analysis pipeline.
//!
//! Fetches prices, resolves weights, aggregates the portfolio, builds the
//! historical risk report and runs the Monte Carlo projection.

use crate::config::AnalysisConfig;
use crate::data::{fetch_returns, MarketDataProvider};
use crate::portfolio::portfolio_returns;
use crate::simulation::{monte_carlo_var, projection_bands, sample_paths, ProjectionBand};
use crate::types::{
    CumulativeReturnSeries, DateRange, PortfolioReturnSeries, RiskReport, SimulationResult,
};
use crate::weights::{resolve_weights, ResolvedWeights, WeightingMode};
use crate::{Error, Result};
use serde::Serialize;
use tracing::info;

/// What to analyze.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisRequest {
    pub assets: Vec<String>,
    pub range: DateRange,
    pub weighting: WeightingMode,
    /// Daily target rate for Sharpe/Sortino
    pub target_rate: f64,
}

impl AnalysisRequest {
    /// Build a request from `YYYY-MM-DD` date strings with a zero target rate.
    pub fn new(assets: Vec<String>, start: &str, end: &str, weighting: WeightingMode) -> Result<Self> {
        if assets.is_empty() {
            return Err(Error::EmptyUniverse);
        }
        Ok(Self {
            assets,
            range: DateRange::parse(start, end)?,
            weighting,
            target_rate: 0.0,
        })
    }

    /// Set the daily target rate.
    pub fn with_target_rate(mut self, daily: f64) -> Self {
        self.target_rate = daily;
        self
    }
}

/// Everything an analysis run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub assets: Vec<String>,
    pub range: DateRange,
    pub weights: ResolvedWeights,
    pub portfolio_returns: PortfolioReturnSeries,
    pub cumulative_returns: CumulativeReturnSeries,
    pub report: RiskReport,
    pub simulation: SimulationResult,
    pub projection: ProjectionBand,
    /// A few simulated daily-return paths for display
    pub sample_paths: Vec<Vec<f64>>,
}

/// Runs analyses with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct PortfolioAnalysis {
    config: AnalysisConfig,
}

impl PortfolioAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the full pipeline for one request.
    pub fn run(
        &self,
        provider: &dyn MarketDataProvider,
        request: &AnalysisRequest,
    ) -> Result<AnalysisOutput> {
        self.config.validate()?;
        info!(
            assets = ?request.assets,
            start = %request.range.start,
            end = %request.range.end,
            "starting portfolio analysis"
        );

        let matrix = fetch_returns(provider, &request.assets, &request.range)?;
        let weights = resolve_weights(matrix.assets(), &request.weighting, provider)?;
        let returns = portfolio_returns(&matrix, &weights.weights)?;
        let cumulative = returns.cumulative();

        let report = RiskReport::build(
            &matrix,
            &weights.weights,
            &returns,
            &self.config.risk_parameters(request.target_rate)?,
        )?;

        let simulation = monte_carlo_var(returns.values(), &self.config.simulation())?;
        let projection = projection_bands(
            &simulation.cumulative_returns,
            self.config.lower_percentile,
            self.config.upper_percentile,
        )?;
        let samples = sample_paths(
            &simulation.daily_returns,
            self.config.sample_paths,
            simulation.seed,
        );

        info!(
            days = returns.len(),
            max_drawdown = report.max_drawdown,
            forward_var = simulation.risk.cumulative.var,
            "portfolio analysis complete"
        );

        Ok(AnalysisOutput {
            assets: matrix.assets().to_vec(),
            range: request.range,
            weights,
            portfolio_returns: returns,
            cumulative_returns: cumulative,
            report,
            simulation,
            projection,
            sample_paths: samples,
        })
    }
}
