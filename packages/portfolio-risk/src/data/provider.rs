//! Market data provider seam and a JSON-backed implementation.

use crate::types::{DateRange, PriceTable};
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Source of price histories and market capitalizations.
///
/// Implementations may hit the network; the engine calls each method once per
/// analysis and never retries.
pub trait MarketDataProvider {
    /// Price levels for `assets` on every available date inside `range`.
    ///
    /// Assets the provider knows nothing about should come back as all-missing
    /// columns rather than be dropped.
    fn fetch_prices(&self, assets: &[String], range: &DateRange) -> Result<PriceTable>;

    /// Market capitalization of an asset, `None` when unknown.
    fn market_cap(&self, asset: &str) -> Result<Option<f64>>;
}

/// A single dated price observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    /// Trading date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Adjusted close, `null` when missing
    pub close: Option<f64>,
}

/// In-memory market data, typically loaded from a JSON snapshot.
///
/// ```json
/// {
///   "prices": { "AAPL": [{ "date": "2023-01-03", "close": 125.07 }] },
///   "market_caps": { "AAPL": 2.9e12 }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticMarketData {
    /// Price history per asset
    #[serde(default)]
    pub prices: BTreeMap<String, Vec<PricePoint>>,
    /// Market capitalization per asset
    #[serde(default)]
    pub market_caps: BTreeMap<String, f64>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a snapshot from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Add a price history for an asset.
    pub fn with_prices(mut self, asset: &str, points: Vec<(NaiveDate, Option<f64>)>) -> Self {
        self.prices.insert(
            asset.to_string(),
            points
                .into_iter()
                .map(|(date, close)| PricePoint { date, close })
                .collect(),
        );
        self
    }

    /// Set the market capitalization for an asset.
    pub fn with_market_cap(mut self, asset: &str, market_cap: f64) -> Self {
        self.market_caps.insert(asset.to_string(), market_cap);
        self
    }
}

impl MarketDataProvider for StaticMarketData {
    fn fetch_prices(&self, assets: &[String], range: &DateRange) -> Result<PriceTable> {
        let dates: Vec<NaiveDate> = assets
            .iter()
            .filter_map(|asset| self.prices.get(asset))
            .flatten()
            .map(|p| p.date)
            .filter(|date| range.contains(*date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = assets
            .iter()
            .map(|asset| {
                let by_date: BTreeMap<NaiveDate, Option<f64>> = self
                    .prices
                    .get(asset)
                    .map(|points| points.iter().map(|p| (p.date, p.close)).collect())
                    .unwrap_or_default();
                dates
                    .iter()
                    .map(|date| by_date.get(date).copied().flatten())
                    .collect()
            })
            .collect();

        PriceTable::new(dates, assets.to_vec(), columns)
    }

    fn market_cap(&self, asset: &str) -> Result<Option<f64>> {
        Ok(self.market_caps.get(asset).copied())
    }
}
