//! Conversion of raw price levels into aligned daily returns.

use super::MarketDataProvider;
use crate::types::{DateRange, PriceTable, ReturnsMatrix};
use crate::{Error, Result};
use tracing::debug;

/// Fetch prices for `assets` over `range` and turn them into a returns matrix.
pub fn fetch_returns(
    provider: &dyn MarketDataProvider,
    assets: &[String],
    range: &DateRange,
) -> Result<ReturnsMatrix> {
    if assets.is_empty() {
        return Err(Error::EmptyUniverse);
    }

    let table = provider.fetch_prices(assets, range)?;
    debug!(
        rows = table.len(),
        assets = assets.len(),
        start = %range.start,
        end = %range.end,
        "fetched price table"
    );

    process_returns(&table, assets)
}

/// Build a returns matrix from a price table.
///
/// Missing prices are forward-filled, then backward-filled to cover leading
/// gaps. Simple percentage changes are taken between consecutive rows and the
/// first row is dropped.
///
/// # Errors
///
/// * `EmptyResult` - the table has fewer than two rows
/// * `DataIntegrity` - an asset has no prices at all, or a price is not a
///   positive finite number
pub fn process_returns(table: &PriceTable, assets: &[String]) -> Result<ReturnsMatrix> {
    if assets.is_empty() {
        return Err(Error::EmptyUniverse);
    }
    if table.is_empty() {
        return Err(Error::EmptyResult(
            "no price data fetched for the given assets and dates".to_string(),
        ));
    }
    if table.len() < 2 {
        return Err(Error::EmptyResult(
            "at least two price rows are needed to compute returns".to_string(),
        ));
    }

    let mut columns = Vec::with_capacity(assets.len());
    for asset in assets {
        let raw = table.column(asset).ok_or_else(|| {
            Error::DataIntegrity(format!("no price column returned for {}", asset))
        })?;

        let gaps = raw.iter().filter(|p| p.is_none()).count();
        let prices = fill_gaps(raw).ok_or_else(|| {
            Error::DataIntegrity(format!("{} has no price data in the requested window", asset))
        })?;
        if gaps > 0 {
            debug!(asset = %asset, gaps, "filled missing prices");
        }

        if let Some(bad) = prices.iter().find(|p| !p.is_finite() || **p <= 0.0) {
            return Err(Error::DataIntegrity(format!(
                "{} has an invalid price level: {}",
                asset, bad
            )));
        }

        columns.push(pct_change(&prices));
    }

    let dates = table.dates()[1..].to_vec();
    ReturnsMatrix::new(dates, assets.to_vec(), columns)
}

/// Forward-fill then backward-fill a column of optional values.
///
/// Returns `None` when the column holds no observation at all, so a fully
/// missing series is never mistaken for a fillable gap.
pub fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first = values.iter().flatten().next().copied()?;

    // Leading gaps take the first observed value (backward fill); everything
    // after carries the last observed value forward.
    let mut last = first;
    Some(
        values
            .iter()
            .map(|v| {
                if let Some(v) = v {
                    last = *v;
                }
                last
            })
            .collect(),
    )
}

/// Simple percentage change between consecutive values: `p[t] / p[t-1] - 1`.
///
/// The output is one element shorter than the input.
pub fn pct_change(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}
