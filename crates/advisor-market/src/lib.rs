//! Market data access for advisor-rs
//!
//! The data-access adapter between the analysis engine and the market-data
//! provider:
//!
//! - [`MarketData`]: the trait the engine's capabilities depend on
//! - [`AlphaVantageClient`]: rate-limited, cached Alpha Vantage implementation
//!   with a degrading quote chain (real-time quote, then latest daily close,
//!   then a zero-valued placeholder)
//! - typed payloads ([`Quote`], [`DailyBar`], [`NewsItem`],
//!   [`IndicatorBundle`], [`CompanyOverview`])
//! - local RSI/MACD/SMA computation from daily closes for when the
//!   provider's indicator endpoints come back empty

pub mod alpha_vantage;
pub mod cache;
pub mod config;
pub mod error;
pub mod indicators;
pub mod provider;
pub mod types;

pub use alpha_vantage::AlphaVantageClient;
pub use cache::{CacheKey, CacheTier, MarketCache};
pub use config::MarketConfig;
pub use error::{MarketError, Result};
pub use provider::MarketData;
pub use types::{
    CompanyOverview, DailyBar, IndicatorBundle, IndicatorPoint, MacdTriple, NewsItem, Quote,
};
