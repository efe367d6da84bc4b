//! Configuration for market data access

use crate::error::{MarketError, Result};
use std::time::Duration;

/// Configuration for the market data client
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Alpha Vantage API key
    pub api_key: String,

    /// Maximum provider requests per minute (free tier: 5)
    pub rate_limit_per_minute: u32,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Cache TTL for quotes
    pub quote_ttl: Duration,

    /// Cache TTL for fundamentals (overview, daily series)
    pub fundamental_ttl: Duration,

    /// Cache TTL for news
    pub news_ttl: Duration,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            rate_limit_per_minute: 5,
            request_timeout: Duration::from_secs(30),
            quote_ttl: Duration::from_secs(60),
            fundamental_ttl: Duration::from_secs(3600),
            news_ttl: Duration::from_secs(300),
        }
    }
}

impl MarketConfig {
    /// Create a configuration with the given API key and defaults elsewhere
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Read the API key from `ALPHA_VANTAGE_API_KEY`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            MarketError::ConfigError(
                "ALPHA_VANTAGE_API_KEY environment variable not set".to_string(),
            )
        })?;
        Ok(Self::new(api_key))
    }

    /// Override the per-minute rate limit
    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(MarketError::ConfigError(
                "Alpha Vantage API key must not be empty".to_string(),
            ));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(MarketError::ConfigError(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MarketConfig::new("key");
        assert_eq!(config.rate_limit_per_minute, 5);
        assert_eq!(config.quote_ttl, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_key_rejected() {
        let config = MarketConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = MarketConfig::new("key").with_rate_limit(0);
        assert!(config.validate().is_err());
    }
}
