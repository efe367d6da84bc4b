//! Alpha Vantage API client
//!
//! Rate-limited, cached implementation of [`MarketData`]. Every response is
//! checked for the provider's in-band failure fields ("Error Message" for a
//! bad request, "Note" for an exhausted quota) before parsing. Quote
//! retrieval degrades through a fallback chain instead of failing: the
//! real-time quote first, then the latest daily close, then a zero-valued
//! placeholder.

use crate::cache::{CacheKey, MarketCache};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use crate::indicators;
use crate::provider::MarketData;
use crate::types::{CompanyOverview, DailyBar, IndicatorBundle, IndicatorPoint, MacdTriple, NewsItem, Quote};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::{Value, json};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const HISTORY_LIMIT: usize = 100;
const SERIES_LIMIT: usize = 30;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage market data client
pub struct AlphaVantageClient {
    client: Client,
    config: MarketConfig,
    rate_limiter: SharedRateLimiter,
    cache: MarketCache,
}

impl AlphaVantageClient {
    /// Create a client from a validated configuration
    pub fn new(config: MarketConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder().timeout(config.request_timeout).build()?;
        let quota = Quota::per_minute(
            NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN),
        );
        let cache = MarketCache::from_config(&config);

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            cache,
        })
    }

    /// Create from the `ALPHA_VANTAGE_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        Self::new(MarketConfig::from_env()?)
    }

    /// One rate-limited provider query with in-band failure checks
    async fn query(&self, function: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let mut query = vec![
            ("function", function),
            ("apikey", self.config.api_key.as_str()),
        ];
        query.extend_from_slice(params);

        let response = self.client.get(BASE_URL).query(&query).send().await?;

        if !response.status().is_success() {
            return Err(MarketError::ProviderError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: Value = response.json().await?;
        Self::check_provider_errors(&data)?;
        Ok(data)
    }

    /// Surface the provider's in-band failure fields as typed errors
    fn check_provider_errors(data: &Value) -> Result<()> {
        if let Some(error) = data.get("Error Message") {
            return Err(MarketError::ProviderError(error.to_string()));
        }
        if data.get("Note").is_some() {
            return Err(MarketError::RateLimitExceeded {
                provider: "Alpha Vantage".to_string(),
            });
        }
        Ok(())
    }

    fn f64_field(values: &Value, key: &str) -> f64 {
        values[key].as_str().unwrap_or("0").parse().unwrap_or(0.0)
    }

    fn u64_field(values: &Value, key: &str) -> u64 {
        values[key].as_str().unwrap_or("0").parse().unwrap_or(0)
    }

    /// Parse a GLOBAL_QUOTE payload; `None` when the quote object is empty
    fn parse_global_quote(symbol: &str, data: &Value) -> Option<Quote> {
        let quote = data.get("Global Quote")?.as_object()?;
        if quote.is_empty() {
            return None;
        }
        let quote = Value::Object(quote.clone());

        let change_percent = quote["10. change percent"]
            .as_str()
            .unwrap_or("0")
            .trim_end_matches('%')
            .parse()
            .unwrap_or(0.0);

        Some(Quote {
            symbol: symbol.to_string(),
            price: Self::f64_field(&quote, "05. price"),
            open: Self::f64_field(&quote, "02. open"),
            high: Self::f64_field(&quote, "03. high"),
            low: Self::f64_field(&quote, "04. low"),
            volume: Self::u64_field(&quote, "06. volume"),
            change: Self::f64_field(&quote, "09. change"),
            change_percent,
            latest_trading_day: quote["07. latest trading day"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Parse a TIME_SERIES_DAILY payload into newest-first bars
    fn parse_daily_series(symbol: &str, data: &Value) -> Result<Vec<DailyBar>> {
        let series = data
            .get("Time Series (Daily)")
            .and_then(Value::as_object)
            .ok_or_else(|| MarketError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no daily series in response".to_string(),
            })?;

        // Object keys are ISO dates; map order is ascending
        let mut bars: Vec<DailyBar> = series
            .iter()
            .map(|(date, values)| DailyBar {
                date: date.clone(),
                open: Self::f64_field(values, "1. open"),
                high: Self::f64_field(values, "2. high"),
                low: Self::f64_field(values, "3. low"),
                close: Self::f64_field(values, "4. close"),
                volume: Self::u64_field(values, "5. volume"),
            })
            .collect();

        bars.reverse();
        bars.truncate(HISTORY_LIMIT);
        Ok(bars)
    }

    /// Parse a NEWS_SENTIMENT feed, matching per-ticker sentiment to `symbol`
    fn parse_news_feed(symbol: &str, data: &Value, limit: usize) -> Vec<NewsItem> {
        let Some(feed) = data.get("feed").and_then(Value::as_array) else {
            return Vec::new();
        };

        feed.iter()
            .take(limit)
            .map(|item| {
                let ticker_entry = item
                    .get("ticker_sentiment")
                    .and_then(Value::as_array)
                    .and_then(|tickers| {
                        tickers.iter().find(|entry| {
                            entry["ticker"]
                                .as_str()
                                .is_some_and(|ticker| ticker.eq_ignore_ascii_case(symbol))
                        })
                    });

                let sentiment_score = ticker_entry
                    .and_then(|entry| entry["ticker_sentiment_score"].as_str())
                    .and_then(|score| score.parse().ok());
                let sentiment_label = ticker_entry
                    .and_then(|entry| entry["ticker_sentiment_label"].as_str())
                    .map(String::from);

                NewsItem {
                    title: item["title"].as_str().unwrap_or_default().to_string(),
                    summary: item["summary"].as_str().unwrap_or_default().to_string(),
                    published_at: item["time_published"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    sentiment_score,
                    sentiment_label,
                }
            })
            .collect()
    }

    /// Latest value from a "Technical Analysis: X" payload
    fn parse_latest_indicator(data: &Value, section: &str, field: &str) -> Option<f64> {
        let series = data.get(section)?.as_object()?;
        // Last key is the most recent date
        let (_, values) = series.iter().next_back()?;
        values[field].as_str()?.parse().ok()
    }

    /// Newest-first series from a "Technical Analysis: X" payload
    fn parse_indicator_series(data: &Value, section: &str, field: &str) -> Vec<IndicatorPoint> {
        let Some(series) = data.get(section).and_then(Value::as_object) else {
            return Vec::new();
        };

        series
            .iter()
            .rev()
            .take(SERIES_LIMIT)
            .filter_map(|(date, values)| {
                values[field].as_str().and_then(|raw| raw.parse().ok()).map(
                    |value| IndicatorPoint {
                        date: date.clone(),
                        value,
                    },
                )
            })
            .collect()
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        // Primary: real-time quote
        match self.query("GLOBAL_QUOTE", &[("symbol", symbol)]).await {
            Ok(data) => {
                if let Some(quote) = Self::parse_global_quote(symbol, &data) {
                    return Ok(quote);
                }
                debug!(symbol, "empty global quote, falling back to daily close");
            }
            Err(e) => {
                warn!(symbol, error = %e, "global quote failed, falling back to daily close");
            }
        }

        // Fallback: latest daily close, reported with zero change
        match self.daily_history(symbol).await {
            Ok(bars) if !bars.is_empty() => {
                let latest = &bars[0];
                Ok(Quote {
                    symbol: symbol.to_string(),
                    price: latest.close,
                    open: latest.open,
                    high: latest.high,
                    low: latest.low,
                    volume: latest.volume,
                    change: 0.0,
                    change_percent: 0.0,
                    latest_trading_day: latest.date.clone(),
                })
            }
            Ok(_) | Err(_) => {
                warn!(symbol, "no quote from any source, returning placeholder");
                Ok(Quote::placeholder(symbol))
            }
        }
    }

    async fn fetch_indicator_value(
        &self,
        symbol: &str,
        function: &str,
        time_period: &str,
    ) -> Option<f64> {
        let params = [
            ("symbol", symbol),
            ("interval", "daily"),
            ("time_period", time_period),
            ("series_type", "close"),
        ];
        match self.query(function, &params).await {
            Ok(data) => Self::parse_latest_indicator(
                &data,
                &format!("Technical Analysis: {function}"),
                function,
            ),
            Err(e) => {
                debug!(symbol, indicator = function, error = %e, "indicator endpoint failed");
                None
            }
        }
    }

    async fn fetch_indicators(&self, symbol: &str) -> IndicatorBundle {
        let rsi = self.fetch_indicator_value(symbol, "RSI", "14").await;

        let macd = match self
            .query(
                "MACD",
                &[
                    ("symbol", symbol),
                    ("interval", "daily"),
                    ("series_type", "close"),
                ],
            )
            .await
        {
            Ok(data) => {
                let section = "Technical Analysis: MACD";
                let macd_line = Self::parse_latest_indicator(&data, section, "MACD");
                let signal = Self::parse_latest_indicator(&data, section, "MACD_Signal");
                let histogram = Self::parse_latest_indicator(&data, section, "MACD_Hist");
                match (macd_line, signal, histogram) {
                    (Some(macd), Some(signal), Some(histogram)) => Some(MacdTriple {
                        macd,
                        signal,
                        histogram,
                    }),
                    _ => None,
                }
            }
            Err(e) => {
                debug!(symbol, indicator = "MACD", error = %e, "indicator endpoint failed");
                None
            }
        };

        let sma = self.fetch_indicator_value(symbol, "SMA", "50").await;

        let bundle = IndicatorBundle { rsi, macd, sma };
        if !bundle.is_empty() {
            return bundle;
        }

        // Endpoint bundle came back empty: compute locally from daily closes
        match self.daily_history(symbol).await {
            Ok(bars) => match indicators::compute_bundle(&bars) {
                Ok(local) => {
                    debug!(symbol, "computed indicators locally from daily history");
                    local
                }
                Err(e) => {
                    warn!(symbol, error = %e, "local indicator computation failed");
                    IndicatorBundle::default()
                }
            },
            Err(e) => {
                warn!(symbol, error = %e, "no daily history for local indicators");
                IndicatorBundle::default()
            }
        }
    }
}

#[async_trait]
impl MarketData for AlphaVantageClient {
    #[instrument(skip(self))]
    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let key = CacheKey::new(symbol, "quote", json!({}));
        let value = self
            .cache
            .quotes
            .get_or_fetch(key, || async {
                let quote = self.fetch_quote(symbol).await?;
                Ok::<_, MarketError>(serde_json::to_value(quote)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self))]
    async fn daily_history(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        let key = CacheKey::new(symbol, "daily", json!({}));
        let value = self
            .cache
            .fundamentals
            .get_or_fetch(key, || async {
                let data = self
                    .query("TIME_SERIES_DAILY", &[("symbol", symbol)])
                    .await?;
                let bars = Self::parse_daily_series(symbol, &data)?;
                Ok::<_, MarketError>(serde_json::to_value(bars)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self))]
    async fn news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let key = CacheKey::new(symbol, "news", json!({ "limit": limit }));
        let value = self
            .cache
            .news
            .get_or_fetch(key, || async {
                let data = self.query("NEWS_SENTIMENT", &[("tickers", symbol)]).await?;
                let items = Self::parse_news_feed(symbol, &data, limit);
                Ok::<_, MarketError>(serde_json::to_value(items)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self))]
    async fn indicators(&self, symbol: &str) -> Result<IndicatorBundle> {
        let key = CacheKey::new(symbol, "indicators", json!({}));
        let value = self
            .cache
            .fundamentals
            .get_or_fetch(key, || async {
                let bundle = self.fetch_indicators(symbol).await;
                Ok::<_, MarketError>(serde_json::to_value(bundle)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self))]
    async fn indicator_series(
        &self,
        symbol: &str,
        indicator: &str,
        period: usize,
    ) -> Result<Vec<IndicatorPoint>> {
        let indicator = indicator.to_uppercase();
        let period = period.to_string();
        let data = self
            .query(
                &indicator,
                &[
                    ("symbol", symbol),
                    ("interval", "daily"),
                    ("time_period", period.as_str()),
                    ("series_type", "close"),
                ],
            )
            .await?;

        let section = format!("Technical Analysis: {indicator}");
        let points = Self::parse_indicator_series(&data, &section, &indicator);
        if points.is_empty() {
            return Err(MarketError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no {indicator} data in response"),
            });
        }
        Ok(points)
    }

    #[instrument(skip(self))]
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        let key = CacheKey::new(symbol, "overview", json!({}));
        let value = self
            .cache
            .fundamentals
            .get_or_fetch(key, || async {
                let data = self.query("OVERVIEW", &[("symbol", symbol)]).await?;
                if data.as_object().is_none_or(serde_json::Map::is_empty) {
                    return Err(MarketError::InvalidSymbol(symbol.to_string()));
                }
                Ok::<_, MarketError>(data)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}
