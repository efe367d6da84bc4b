//! Caching layer for market data to reduce provider calls

use crate::config::MarketConfig;
use cached::{Cached, TimedCache};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for market data requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Ticker symbol
    pub symbol: String,
    /// Endpoint or operation name
    pub endpoint: String,
    /// Additional parameters as a JSON string
    pub params: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(
        symbol: impl Into<String>,
        endpoint: impl Into<String>,
        params: impl Serialize,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            endpoint: endpoint.into(),
            params: serde_json::to_string(&params).unwrap_or_default(),
        }
    }
}

/// One TTL-bound cache tier
pub struct CacheTier {
    cache: Arc<RwLock<TimedCache<CacheKey, Value>>>,
}

impl CacheTier {
    /// Create a tier with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: CacheKey, value: Value) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Get a cached value or fetch and cache it
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(?key, "cache hit");
            return Ok(value);
        }

        tracing::debug!(?key, "cache miss");
        let value = fetcher().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// True when no entries are cached
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Clone for CacheTier {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

/// Tiered cache for the different market data classes
pub struct MarketCache {
    /// Real-time quotes, short TTL
    pub quotes: CacheTier,
    /// Fundamentals and daily series, long TTL
    pub fundamentals: CacheTier,
    /// News, medium TTL
    pub news: CacheTier,
}

impl MarketCache {
    /// Create a cache with the TTLs from the configuration
    pub fn from_config(config: &MarketConfig) -> Self {
        Self {
            quotes: CacheTier::new(config.quote_ttl),
            fundamentals: CacheTier::new(config.fundamental_ttl),
            news: CacheTier::new(config.news_ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_get() {
        let tier = CacheTier::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "quote", json!({}));
        let value = json!({"price": 150.0});

        tier.insert(key.clone(), value.clone()).await;
        assert_eq!(tier.get(&key).await, Some(value));
        assert_eq!(tier.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_skips_fetcher_on_hit() {
        let tier = CacheTier::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "quote", json!({}));

        let mut calls = 0;
        let value = tier
            .get_or_fetch(key.clone(), || {
                calls += 1;
                async { Ok::<_, String>(json!({"price": 1.0})) }
            })
            .await
            .unwrap();
        assert_eq!(value["price"], 1.0);
        assert_eq!(calls, 1);

        let value = tier
            .get_or_fetch(key, || {
                calls += 1;
                async { Ok::<_, String>(json!({"price": 2.0})) }
            })
            .await
            .unwrap();
        assert_eq!(value["price"], 1.0);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_distinct_params_are_distinct_keys() {
        let tier = CacheTier::new(Duration::from_secs(60));
        let key_a = CacheKey::new("AAPL", "news", json!({"limit": 5}));
        let key_b = CacheKey::new("AAPL", "news", json!({"limit": 10}));

        tier.insert(key_a.clone(), json!(5)).await;
        assert!(tier.get(&key_b).await.is_none());
        assert!(tier.get(&key_a).await.is_some());
    }

    #[tokio::test]
    async fn test_from_config_tiers() {
        let cache = MarketCache::from_config(&MarketConfig::new("key"));
        assert!(cache.quotes.is_empty().await);
        assert!(cache.fundamentals.is_empty().await);
        assert!(cache.news.is_empty().await);
    }
}
