//! Portfolio weight resolution.
//!
//! Weights come from one of three policies:
//!
//! - **Equal**: `1/N` per asset
//! - **Market cap**: proportional to market capitalization, with unknown caps
//!   replaced by the mean of the known ones
//! - **Explicit**: caller-supplied weights, rescaled to sum to 1 when they
//!   don't, and the rescaling is reported back through [`WeightAdjustment`]

use crate::data::MarketDataProvider;
use crate::types::{WeightVector, WEIGHT_TOLERANCE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// How portfolio weights are chosen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum WeightingMode {
    Equal,
    MarketCap,
    Explicit(Vec<f64>),
}

impl FromStr for WeightingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "equal" | "equalweights" | "equal-weights" => Ok(WeightingMode::Equal),
            "market-cap" | "marketcap" | "market_cap" => Ok(WeightingMode::MarketCap),
            other => Err(Error::InvalidInput(format!(
                "unknown weighting mode '{}' (expected 'equal' or 'market-cap')",
                other
            ))),
        }
    }
}

/// Adjustment applied while turning raw weights into a normalized vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightAdjustment {
    /// Weights already summed to 1
    None,
    /// Total reached 1 before the last asset; the remaining assets got weight 0
    ZeroFilled { assets: Vec<String> },
    /// Weights were divided by their total to restore a sum of 1
    Rescaled { original_sum: f64 },
    /// Some market caps were unknown and replaced by the mean of the known ones
    MarketCapImputed { assets: Vec<String> },
    /// No market cap was known; equal weights were used instead
    EqualFallback,
}

/// A weight vector together with the adjustment that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedWeights {
    pub weights: WeightVector,
    pub adjustment: WeightAdjustment,
}

impl ResolvedWeights {
    fn unadjusted(weights: WeightVector) -> Self {
        Self {
            weights,
            adjustment: WeightAdjustment::None,
        }
    }
}

/// Resolve weights for `assets` under the given mode.
pub fn resolve_weights(
    assets: &[String],
    mode: &WeightingMode,
    provider: &dyn MarketDataProvider,
) -> Result<ResolvedWeights> {
    if assets.is_empty() {
        return Err(Error::EmptyUniverse);
    }

    match mode {
        WeightingMode::Equal => Ok(ResolvedWeights::unadjusted(equal_weights(assets)?)),
        WeightingMode::MarketCap => market_cap_weights(assets, provider),
        WeightingMode::Explicit(raw) => explicit_weights(assets, raw),
    }
}

/// Equal weights of `1/N`.
pub fn equal_weights(assets: &[String]) -> Result<WeightVector> {
    if assets.is_empty() {
        return Err(Error::EmptyUniverse);
    }
    WeightVector::equal(assets.to_vec())
}

/// Market-capitalization weights.
///
/// Caps that are missing, zero, negative or non-finite are treated as
/// unknown. Unknown caps take the mean of the known ones; if none is known the
/// portfolio falls back to equal weights.
pub fn market_cap_weights(
    assets: &[String],
    provider: &dyn MarketDataProvider,
) -> Result<ResolvedWeights> {
    if assets.is_empty() {
        return Err(Error::EmptyUniverse);
    }

    let mut caps = Vec::with_capacity(assets.len());
    for asset in assets {
        let cap = provider
            .market_cap(asset)?
            .filter(|c| c.is_finite() && *c > 0.0);
        caps.push(cap);
    }

    let known: Vec<f64> = caps.iter().flatten().copied().collect();
    if known.is_empty() {
        warn!("no market caps available, falling back to equal weights");
        return Ok(ResolvedWeights {
            weights: equal_weights(assets)?,
            adjustment: WeightAdjustment::EqualFallback,
        });
    }

    let mean_cap = known.iter().sum::<f64>() / known.len() as f64;
    let imputed: Vec<String> = assets
        .iter()
        .zip(&caps)
        .filter(|(_, cap)| cap.is_none())
        .map(|(asset, _)| asset.clone())
        .collect();
    if !imputed.is_empty() {
        warn!(assets = ?imputed, mean_cap, "imputing missing market caps");
    }

    let filled: Vec<f64> = caps.iter().map(|c| c.unwrap_or(mean_cap)).collect();
    let total: f64 = filled.iter().sum();
    let weights = WeightVector::new(
        assets.to_vec(),
        filled.iter().map(|c| c / total).collect(),
    )?;

    let adjustment = if imputed.is_empty() {
        WeightAdjustment::None
    } else {
        WeightAdjustment::MarketCapImputed { assets: imputed }
    };
    Ok(ResolvedWeights {
        weights,
        adjustment,
    })
}

/// Caller-supplied weights in asset order.
///
/// A full vector is normalized as a whole. A shorter one is fed through a
/// [`WeightCollector`], so it is accepted only if its running total reaches 1
/// and the assets left out get weight 0.
pub fn explicit_weights(assets: &[String], raw: &[f64]) -> Result<ResolvedWeights> {
    if raw.len() >= assets.len() {
        return normalize_weights(assets, raw);
    }

    let mut collector = WeightCollector::new(assets.to_vec())?;
    for (idx, weight) in raw.iter().enumerate() {
        // Weights past the point where entry closed are not accepted
        if collector.push(*weight)? && idx + 1 < raw.len() {
            return Err(Error::DimensionMismatch {
                expected: idx + 1,
                actual: raw.len(),
            });
        }
    }
    if !collector.is_complete() {
        return Err(Error::DimensionMismatch {
            expected: assets.len(),
            actual: raw.len(),
        });
    }
    collector.finish()
}

/// Normalize a complete vector of caller-supplied weights.
///
/// Weights already summing to 1 are kept as-is (shorts allowed). Otherwise the
/// vector is divided by its total and the rescaling is reported. A total that
/// is zero or negative cannot be rescaled and fails.
pub fn normalize_weights(assets: &[String], raw: &[f64]) -> Result<ResolvedWeights> {
    let weights = WeightVector::new(assets.to_vec(), raw.to_vec())?;
    let total = weights.sum();

    if weights.is_normalized() {
        return Ok(ResolvedWeights::unadjusted(weights));
    }
    if total <= WEIGHT_TOLERANCE {
        return Err(Error::WeightsNotNormalized { sum: total });
    }

    warn!(original_sum = total, "weights do not sum to 1, rescaling");
    Ok(ResolvedWeights {
        weights: WeightVector::new(
            assets.to_vec(),
            raw.iter().map(|w| w / total).collect(),
        )?,
        adjustment: WeightAdjustment::Rescaled {
            original_sum: total,
        },
    })
}

/// Collects explicit weights one asset at a time.
///
/// Entry stops early once the running total reaches 1; the remaining assets
/// receive weight 0. Whatever was collected is normalized once in
/// [`WeightCollector::finish`].
#[derive(Debug, Clone)]
pub struct WeightCollector {
    assets: Vec<String>,
    weights: Vec<f64>,
    total: f64,
    closed: bool,
}

impl WeightCollector {
    pub fn new(assets: Vec<String>) -> Result<Self> {
        if assets.is_empty() {
            return Err(Error::EmptyUniverse);
        }
        Ok(Self {
            weights: Vec::with_capacity(assets.len()),
            assets,
            total: 0.0,
            closed: false,
        })
    }

    /// Asset whose weight is expected next, `None` once collection is complete.
    pub fn next_asset(&self) -> Option<&str> {
        if self.closed {
            return None;
        }
        self.assets.get(self.weights.len()).map(String::as_str)
    }

    /// Sum of the weights entered so far.
    pub fn running_total(&self) -> f64 {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.next_asset().is_none()
    }

    /// Record the weight for the next asset.
    ///
    /// Returns `true` when no more weights are expected.
    pub fn push(&mut self, weight: f64) -> Result<bool> {
        let asset = self
            .next_asset()
            .ok_or_else(|| Error::InvalidInput("all weights already collected".to_string()))?
            .to_string();
        if !weight.is_finite() {
            return Err(Error::InvalidInput(format!(
                "weight for {} is not finite: {}",
                asset, weight
            )));
        }

        self.weights.push(weight);
        self.total += weight;

        if (self.total - 1.0).abs() <= WEIGHT_TOLERANCE && self.weights.len() < self.assets.len()
        {
            debug!(asset = %asset, "weights reached 1 before the last asset");
            self.closed = true;
        }

        Ok(self.is_complete())
    }

    /// Zero-fill any assets skipped after the total hit 1, then normalize.
    pub fn finish(self) -> Result<ResolvedWeights> {
        if !self.is_complete() {
            return Err(Error::DimensionMismatch {
                expected: self.assets.len(),
                actual: self.weights.len(),
            });
        }

        let zeroed: Vec<String> = self.assets[self.weights.len()..].to_vec();
        let mut raw = self.weights;
        raw.resize(self.assets.len(), 0.0);

        let resolved = normalize_weights(&self.assets, &raw)?;
        if zeroed.is_empty() {
            return Ok(resolved);
        }
        Ok(ResolvedWeights {
            weights: resolved.weights,
            adjustment: WeightAdjustment::ZeroFilled { assets: zeroed },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticMarketData;
    use approx::assert_relative_eq;

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_equal_weights_four_assets() {
        let assets = tickers(&["AAPL", "MSFT", "GOOGL", "AMZN"]);
        let resolved =
            resolve_weights(&assets, &WeightingMode::Equal, &StaticMarketData::new()).unwrap();

        assert_eq!(resolved.weights.weights(), &[0.25, 0.25, 0.25, 0.25]);
        assert_eq!(resolved.adjustment, WeightAdjustment::None);
    }

    #[test]
    fn test_empty_universe() {
        let result = resolve_weights(&[], &WeightingMode::Equal, &StaticMarketData::new());
        assert!(matches!(result, Err(Error::EmptyUniverse)));
    }

    #[test]
    fn test_market_cap_weights() {
        let provider = StaticMarketData::new()
            .with_market_cap("A", 300.0)
            .with_market_cap("B", 100.0);
        let resolved = market_cap_weights(&tickers(&["A", "B"]), &provider).unwrap();

        assert_relative_eq!(resolved.weights.weights()[0], 0.75, epsilon = 1e-12);
        assert_relative_eq!(resolved.weights.weights()[1], 0.25, epsilon = 1e-12);
        assert_eq!(resolved.adjustment, WeightAdjustment::None);
    }

    #[test]
    fn test_market_cap_imputes_missing() {
        let provider = StaticMarketData::new()
            .with_market_cap("A", 300.0)
            .with_market_cap("B", 100.0)
            .with_market_cap("C", 0.0);
        let resolved = market_cap_weights(&tickers(&["A", "B", "C"]), &provider).unwrap();

        // C takes the mean of known caps (200); total 600
        let w = resolved.weights.weights();
        assert_relative_eq!(w[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(w[1], 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(w[2], 1.0 / 3.0, epsilon = 1e-12);
        assert_eq!(
            resolved.adjustment,
            WeightAdjustment::MarketCapImputed {
                assets: tickers(&["C"])
            }
        );
    }

    #[test]
    fn test_market_cap_all_missing_falls_back_to_equal() {
        let provider = StaticMarketData::new().with_market_cap("A", 0.0);
        let resolved = market_cap_weights(&tickers(&["A", "B"]), &provider).unwrap();

        assert_eq!(resolved.weights.weights(), &[0.5, 0.5]);
        assert_eq!(resolved.adjustment, WeightAdjustment::EqualFallback);
    }

    #[test]
    fn test_policy_weights_are_normalized_and_non_negative() {
        let provider = StaticMarketData::new()
            .with_market_cap("A", 2.9e12)
            .with_market_cap("B", 3.1e12)
            .with_market_cap("D", 7.5e11);
        let assets = tickers(&["A", "B", "C", "D", "E", "F", "G"]);

        for mode in [WeightingMode::Equal, WeightingMode::MarketCap] {
            let resolved = resolve_weights(&assets, &mode, &provider).unwrap();
            assert!((resolved.weights.sum() - 1.0).abs() < 1e-8);
            assert!(resolved.weights.weights().iter().all(|w| *w >= 0.0));
        }
    }

    #[test]
    fn test_weighting_mode_from_str() {
        assert_eq!("equal".parse::<WeightingMode>().unwrap(), WeightingMode::Equal);
        assert_eq!(
            "equalweights".parse::<WeightingMode>().unwrap(),
            WeightingMode::Equal
        );
        assert_eq!(
            "Market-Cap".parse::<WeightingMode>().unwrap(),
            WeightingMode::MarketCap
        );
        assert!("random".parse::<WeightingMode>().is_err());
    }

    #[test]
    fn test_explicit_weights_kept_when_normalized() {
        let resolved = normalize_weights(&tickers(&["A", "B"]), &[1.3, -0.3]).unwrap();
        assert_eq!(resolved.weights.weights(), &[1.3, -0.3]);
        assert_eq!(resolved.adjustment, WeightAdjustment::None);
    }

    #[test]
    fn test_explicit_weights_rescaled_and_reported() {
        let resolved = normalize_weights(&tickers(&["A", "B"]), &[0.6, 0.6]).unwrap();
        assert_relative_eq!(resolved.weights.weights()[0], 0.5, epsilon = 1e-12);
        assert_eq!(
            resolved.adjustment,
            WeightAdjustment::Rescaled { original_sum: 1.2 }
        );
    }

    #[test]
    fn test_explicit_weights_length_mismatch() {
        let assets = tickers(&["A", "B", "C"]);
        for raw in [
            vec![0.5],
            vec![0.3, 0.3],
            vec![1.0, 0.2],
            vec![0.2, 0.3, 0.4, 0.1],
        ] {
            let result = resolve_weights(
                &assets,
                &WeightingMode::Explicit(raw),
                &StaticMarketData::new(),
            );
            assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
        }
    }

    #[test]
    fn test_explicit_short_vector_reaching_one_is_zero_filled() {
        let resolved = resolve_weights(
            &tickers(&["A", "B", "C"]),
            &WeightingMode::Explicit(vec![0.4, 0.6]),
            &StaticMarketData::new(),
        )
        .unwrap();

        assert_eq!(resolved.weights.weights(), &[0.4, 0.6, 0.0]);
        assert_eq!(
            resolved.adjustment,
            WeightAdjustment::ZeroFilled {
                assets: tickers(&["C"])
            }
        );
    }

    #[test]
    fn test_explicit_full_vector_is_normalized() {
        let resolved = resolve_weights(
            &tickers(&["A", "B"]),
            &WeightingMode::Explicit(vec![0.6, 0.6]),
            &StaticMarketData::new(),
        )
        .unwrap();
        assert_eq!(resolved.weights.weights(), &[0.5, 0.5]);
    }

    #[test]
    fn test_explicit_weights_zero_total() {
        let result = normalize_weights(&tickers(&["A", "B"]), &[0.5, -0.5]);
        assert!(matches!(result, Err(Error::WeightsNotNormalized { .. })));
    }

    #[test]
    fn test_collector_stops_when_total_reaches_one() {
        let mut collector = WeightCollector::new(tickers(&["A", "B", "C"])).unwrap();
        assert_eq!(collector.next_asset(), Some("A"));

        assert!(!collector.push(0.4).unwrap());
        assert!(collector.push(0.6).unwrap());
        assert_eq!(collector.next_asset(), None);
        assert!(collector.push(0.1).is_err());

        let resolved = collector.finish().unwrap();
        assert_eq!(resolved.weights.weights(), &[0.4, 0.6, 0.0]);
        assert_eq!(
            resolved.adjustment,
            WeightAdjustment::ZeroFilled {
                assets: tickers(&["C"])
            }
        );
    }

    #[test]
    fn test_collector_rescales_overshoot() {
        let mut collector = WeightCollector::new(tickers(&["A", "B"])).unwrap();
        collector.push(0.8).unwrap();
        assert!(collector.push(0.8).unwrap());
        assert_relative_eq!(collector.running_total(), 1.6, epsilon = 1e-12);

        let resolved = collector.finish().unwrap();
        assert_eq!(resolved.weights.weights(), &[0.5, 0.5]);
        assert!(matches!(
            resolved.adjustment,
            WeightAdjustment::Rescaled { .. }
        ));
    }

    #[test]
    fn test_collector_rescales_undershoot() {
        let mut collector = WeightCollector::new(tickers(&["A", "B"])).unwrap();
        collector.push(0.2).unwrap();
        collector.push(0.2).unwrap();

        let resolved = collector.finish().unwrap();
        assert_eq!(resolved.weights.weights(), &[0.5, 0.5]);
        assert!(matches!(
            resolved.adjustment,
            WeightAdjustment::Rescaled { .. }
        ));
    }

    #[test]
    fn test_collector_incomplete() {
        let mut collector = WeightCollector::new(tickers(&["A", "B"])).unwrap();
        collector.push(0.2).unwrap();
        assert!(matches!(
            collector.finish(),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_collector_rejects_nan() {
        let mut collector = WeightCollector::new(tickers(&["A"])).unwrap();
        assert!(matches!(
            collector.push(f64::NAN),
            Err(Error::InvalidInput(_))
        ));
    }
}
