//! Portfolio Risk - quantitative risk engine for multi-asset portfolios.
//!
//! This crate turns raw per-asset price histories into portfolio-level returns
//! and risk figures:
//!
//! - **Returns processing**: gap filling and day-over-day returns per asset
//! - **Weights**: equal, market-capitalization or explicit weighting
//! - **Aggregation**: portfolio returns and compounded cumulative returns
//! - **Risk metrics**: VaR, CVaR, Sharpe ratio, Sortino ratio, drawdowns, risk contribution
//! - **Monte Carlo**: forward VaR/CVaR from simulated return paths
//!
//! # Example
//!
//! ```rust,no_run
//! use portfolio_risk::{
//!     analysis::{AnalysisRequest, PortfolioAnalysis},
//!     data::StaticMarketData,
//!     weights::WeightingMode,
//!     AnalysisConfig,
//! };
//!
//! let provider = StaticMarketData::load("prices.json").unwrap();
//! let request = AnalysisRequest::new(
//!     vec!["AAPL".into(), "MSFT".into()],
//!     "2023-01-01",
//!     "2023-12-31",
//!     WeightingMode::Equal,
//! )
//! .unwrap();
//!
//! let analysis = PortfolioAnalysis::new(AnalysisConfig::default());
//! let output = analysis.run(&provider, &request).unwrap();
//! println!("VaR: {:?}", output.report.var);
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod portfolio;
pub mod risk;
pub mod simulation;
pub mod types;
pub mod weights;

// Re-export commonly used types
pub use analysis::{AnalysisOutput, AnalysisRequest, PortfolioAnalysis};
pub use config::AnalysisConfig;
pub use types::{
    ApiResponse, AssetReturnSeries, CumulativeReturnSeries, DateRange, MetricValue,
    MonteCarloRisk, PortfolioReturnSeries, PriceTable, ReturnsMatrix, RiskContribution,
    RiskContributions, RiskReport, SimulationResult, TailRisk, WeightVector,
};

// Re-export main functionality
pub use data::{process_returns, MarketDataProvider, StaticMarketData};
pub use portfolio::{
    annual_to_daily_rate, cumulative_returns, cumulative_returns_batch, daily_to_annual_rate,
    portfolio_returns,
};
pub use risk::{
    conditional_value_at_risk, drawdowns, max_drawdown, risk_contributions, sharpe_ratio,
    sortino_ratio, value_at_risk, RiskParameters, VarMethod,
};
pub use simulation::{
    monte_carlo_var, projection_bands, sample_paths, simulate_future_returns, ProjectionBand,
    SimulationConfig,
};
pub use weights::{resolve_weights, WeightAdjustment, WeightCollector, WeightingMode};

/// Error types for portfolio-risk operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid date: {0}")]
    Date(#[from] chrono::ParseError),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Asset universe is empty")]
    EmptyUniverse,

    #[error("Dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Asset mismatch at column {index}: expected {expected}, got {actual}")]
    AssetMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Weights must sum to 1, got {sum}")]
    WeightsNotNormalized { sum: f64 },

    #[error("Invalid VaR method: {0} (expected 'historical' or 'parametric')")]
    InvalidMethod(String),

    #[error("Confidence level must be in (0, 1), got {0}")]
    InvalidConfidenceLevel(f64),

    #[error("Undefined metric: {0}")]
    UndefinedMetric(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for portfolio-risk operations.
pub type Result<T> = std::result::Result<T, Error>;
