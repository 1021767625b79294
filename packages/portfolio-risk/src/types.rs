//! Core data types for the portfolio risk engine.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tolerance used when checking that weights sum to 1.
pub const WEIGHT_TOLERANCE: f64 = 1e-8;

/// ISO-8601 date format accepted at the engine boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)?)
}

/// Half-open date window `[start, end)` used for price fetches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "DateRangeBounds")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting empty or inverted windows.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidInput(format!(
                "start date {} must be before end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Whether a date falls inside the window (end exclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

#[derive(Deserialize)]
struct DateRangeBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<DateRangeBounds> for DateRange {
    type Error = Error;

    fn try_from(bounds: DateRangeBounds) -> Result<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

/// Raw price levels as delivered by a data provider.
///
/// Rows are dates in strictly increasing order; each column holds one asset's
/// prices with `None` marking a missing observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Build a table, checking that every column matches the date index.
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if assets.len() != columns.len() {
            return Err(Error::DimensionMismatch {
                expected: assets.len(),
                actual: columns.len(),
            });
        }
        if let Some(column) = columns.iter().find(|c| c.len() != dates.len()) {
            return Err(Error::DimensionMismatch {
                expected: dates.len(),
                actual: column.len(),
            });
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::DataIntegrity(
                "price dates must be strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            dates,
            assets,
            columns,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Price column for an asset, if the provider returned one.
    pub fn column(&self, asset: &str) -> Option<&[Option<f64>]> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Number of date rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Day-over-day returns of a single asset, paired with their dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetReturnSeries {
    pub asset: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl AssetReturnSeries {
    /// Iterate over the return values only.
    pub fn returns(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, r)| *r)
    }
}

/// Aligned per-asset returns: rows are dates, columns are assets.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReturnsMatrix {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    /// Column-major storage, one vector per asset.
    columns: Vec<Vec<f64>>,
}

impl ReturnsMatrix {
    /// Build a matrix from per-asset columns sharing one date index.
    pub fn new(dates: Vec<NaiveDate>, assets: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if assets.is_empty() {
            return Err(Error::EmptyUniverse);
        }
        if assets.len() != columns.len() {
            return Err(Error::DimensionMismatch {
                expected: assets.len(),
                actual: columns.len(),
            });
        }
        if let Some(column) = columns.iter().find(|c| c.len() != dates.len()) {
            return Err(Error::DimensionMismatch {
                expected: dates.len(),
                actual: column.len(),
            });
        }
        check_unique(&assets)?;
        Ok(Self {
            dates,
            assets,
            columns,
        })
    }

    /// Build a matrix from date-major rows (one row per date, one value per asset).
    pub fn from_rows(dates: Vec<NaiveDate>, assets: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        if rows.len() != dates.len() {
            return Err(Error::DimensionMismatch {
                expected: dates.len(),
                actual: rows.len(),
            });
        }
        let mut columns = vec![Vec::with_capacity(rows.len()); assets.len()];
        for row in rows {
            if row.len() != assets.len() {
                return Err(Error::DimensionMismatch {
                    expected: assets.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(*value);
            }
        }
        Self::new(dates, assets, columns)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Number of date rows.
    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    /// Number of asset columns.
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Returns of the asset at column `idx`.
    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Returns of every asset on the date at row `t`.
    pub fn row(&self, t: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[t]).collect()
    }

    /// Date-paired series for one asset.
    pub fn series(&self, asset: &str) -> Option<AssetReturnSeries> {
        let idx = self.assets.iter().position(|a| a == asset)?;
        Some(AssetReturnSeries {
            asset: asset.to_string(),
            points: self
                .dates
                .iter()
                .copied()
                .zip(self.columns[idx].iter().copied())
                .collect(),
        })
    }
}

fn check_unique(assets: &[String]) -> Result<()> {
    for (idx, asset) in assets.iter().enumerate() {
        if assets[..idx].contains(asset) {
            return Err(Error::InvalidInput(format!("duplicate asset {}", asset)));
        }
    }
    Ok(())
}

/// Portfolio weights bound to the assets they apply to.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeightVector {
    assets: Vec<String>,
    weights: Vec<f64>,
}

impl WeightVector {
    /// Pair assets with weights. Weights must be finite; they need not sum to 1.
    pub fn new(assets: Vec<String>, weights: Vec<f64>) -> Result<Self> {
        if assets.is_empty() {
            return Err(Error::EmptyUniverse);
        }
        if assets.len() != weights.len() {
            return Err(Error::DimensionMismatch {
                expected: assets.len(),
                actual: weights.len(),
            });
        }
        if let Some((asset, w)) = assets.iter().zip(&weights).find(|(_, w)| !w.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "weight for {} is not finite: {}",
                asset, w
            )));
        }
        check_unique(&assets)?;
        Ok(Self { assets, weights })
    }

    /// Equal weights of `1/N` for each asset.
    pub fn equal(assets: Vec<String>) -> Result<Self> {
        let n = assets.len();
        Self::new(assets, vec![1.0 / n.max(1) as f64; n])
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight assigned to an asset, if it is part of the vector.
    pub fn weight_of(&self, asset: &str) -> Option<f64> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|idx| self.weights[idx])
    }

    /// Iterate over `(asset, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.assets
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Whether the weights sum to 1 within [`WEIGHT_TOLERANCE`].
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_TOLERANCE
    }

    /// Fail with `WeightsNotNormalized` unless the weights sum to 1.
    pub fn ensure_normalized(&self) -> Result<()> {
        if self.is_normalized() {
            Ok(())
        } else {
            Err(Error::WeightsNotNormalized { sum: self.sum() })
        }
    }
}

/// A date-indexed series of values. Read-only once built.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(Error::DimensionMismatch {
                expected: dates.len(),
                actual: values.len(),
            });
        }
        Ok(Self { dates, values })
    }

    /// Build from parts already known to be the same length.
    pub(crate) fn from_parts(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// Portfolio-level daily returns.
pub type PortfolioReturnSeries = TimeSeries;

/// Compounded returns since the first date.
pub type CumulativeReturnSeries = TimeSeries;

/// Decline from the running wealth peak, one value per date (always <= 0).
pub type DrawdownSeries = TimeSeries;

/// A metric that may be undefined for the given sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricValue {
    Defined { value: f64 },
    Undefined { reason: String },
}

impl MetricValue {
    /// Turn an `UndefinedMetric` error into an explicit undefined value.
    ///
    /// Any other error is propagated unchanged.
    pub fn from_result(result: Result<f64>) -> Result<Self> {
        match result {
            Ok(value) => Ok(MetricValue::Defined { value }),
            Err(Error::UndefinedMetric(reason)) => Ok(MetricValue::Undefined { reason }),
            Err(e) => Err(e),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            MetricValue::Defined { value } => Some(*value),
            MetricValue::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, MetricValue::Defined { .. })
    }
}

/// Risk decomposition for one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskContribution {
    /// Asset identifier
    pub asset: String,
    /// Marginal contribution to risk: `(Σw)_i / σ_p`
    pub marginal: f64,
    /// Total contribution: marginal × weight
    pub total: f64,
    /// Share of portfolio risk; sums to 1 across assets
    pub normalized: f64,
}

/// Per-asset risk decomposition, or the reason it is undefined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RiskContributions {
    Defined { assets: Vec<RiskContribution> },
    Undefined { reason: String },
}

impl RiskContributions {
    /// Keep the table when it could be computed.
    ///
    /// `UndefinedMetric` (no portfolio risk) and `WeightsNotNormalized` become
    /// an undefined table; any other error is propagated unchanged.
    pub fn from_result(result: Result<Vec<RiskContribution>>) -> Result<Self> {
        match result {
            Ok(assets) => Ok(RiskContributions::Defined { assets }),
            Err(Error::UndefinedMetric(reason)) => Ok(RiskContributions::Undefined { reason }),
            Err(e @ Error::WeightsNotNormalized { .. }) => Ok(RiskContributions::Undefined {
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    pub fn as_slice(&self) -> Option<&[RiskContribution]> {
        match self {
            RiskContributions::Defined { assets } => Some(assets),
            RiskContributions::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, RiskContributions::Defined { .. })
    }
}

/// Historical risk figures for one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    /// Confidence level used for VaR/CVaR (e.g., 0.95)
    pub confidence_level: f64,
    /// VaR method used ("historical" or "parametric")
    pub var_method: String,
    /// Value at Risk as a daily return (negative means loss)
    pub var: MetricValue,
    /// Conditional VaR (expected shortfall) as a daily return
    pub cvar: MetricValue,
    /// Sharpe ratio against the daily target rate
    pub sharpe_ratio: MetricValue,
    /// Sortino ratio against the daily target rate
    pub sortino_ratio: MetricValue,
    /// Daily target rate used for Sharpe/Sortino
    pub target_rate_daily: f64,
    /// Annualized equivalent of the daily target rate
    pub target_rate_annual: f64,
    /// Drawdown per date
    pub drawdowns: DrawdownSeries,
    /// Minimum of the drawdown series
    pub max_drawdown: f64,
    /// Per-asset risk decomposition
    pub risk_contributions: RiskContributions,
}

/// VaR and CVaR pair derived from a return distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TailRisk {
    pub var: f64,
    pub cvar: f64,
}

/// Forward tail risk from a Monte Carlo ensemble.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MonteCarloRisk {
    /// Tail risk over every simulated daily return
    pub daily: TailRisk,
    /// Tail risk of cumulative returns at the end of the horizon
    pub cumulative: TailRisk,
}

/// Simulated return ensemble with its derived forward risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Number of simulated paths
    pub num_simulations: usize,
    /// Simulated days per path
    pub horizon_days: usize,
    /// Seed the ensemble was drawn with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Daily returns, one row per path
    #[serde(skip)]
    pub daily_returns: Vec<Vec<f64>>,
    /// Cumulative returns, one row per path
    #[serde(skip)]
    pub cumulative_returns: Vec<Vec<f64>>,
    /// Forward VaR/CVaR
    pub risk: MonteCarloRisk,
}

impl SimulationResult {
    /// Cumulative return of every path on the last simulated day.
    pub fn terminal_returns(&self) -> Vec<f64> {
        self.cumulative_returns
            .iter()
            .filter_map(|path| path.last().copied())
            .collect()
    }
}

/// API response wrapper for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
