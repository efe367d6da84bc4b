//! Market data provider trait

use crate::Result;
use crate::types::{CompanyOverview, DailyBar, IndicatorBundle, IndicatorPoint, NewsItem, Quote};
use async_trait::async_trait;

/// Trait the analysis capabilities depend on for market data
///
/// The engine never talks to a concrete client; construction-time injection
/// of this trait keeps the orchestrators testable against canned data.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Current quote, degrading to a zero-valued placeholder when no source
    /// has data; only transport-independent failures surface as `Err`
    async fn quote(&self, symbol: &str) -> Result<Quote>;

    /// Daily OHLCV history, newest first, at most 100 bars
    async fn daily_history(&self, symbol: &str) -> Result<Vec<DailyBar>>;

    /// Most recent news items for the symbol, at most `limit`
    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>>;

    /// Latest RSI(14)/MACD(12,26,9)/SMA(50) values
    async fn indicators(&self, symbol: &str) -> Result<IndicatorBundle>;

    /// Latest values of one named indicator, newest first
    async fn indicator_series(
        &self,
        symbol: &str,
        indicator: &str,
        period: usize,
    ) -> Result<Vec<IndicatorPoint>>;

    /// Company identity and valuation fundamentals
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview>;
}
