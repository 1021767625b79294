//! Price data ingestion.
//!
//! Provides the market data provider seam and the conversion of raw price
//! levels into aligned day-over-day returns.

mod provider;
mod returns;

pub use provider::{MarketDataProvider, PricePoint, StaticMarketData};
pub use returns::{fetch_returns, fill_gaps, pct_change, process_returns};
