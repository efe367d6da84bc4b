//! Typed market data payloads

use serde::{Deserialize, Serialize};

/// Real-time quote snapshot
///
/// When both the real-time endpoint and the daily fallback come back empty,
/// the client degrades to a zero-valued placeholder instead of failing;
/// [`Quote::is_placeholder`] detects that case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub change: f64,
    pub change_percent: f64,
    pub latest_trading_day: String,
}

impl Quote {
    /// Zero-valued placeholder for a symbol with no retrievable quote
    pub fn placeholder(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// True when the quote carries no usable price
    pub fn is_placeholder(&self) -> bool {
        self.price <= 0.0
    }
}

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// One news item with optional per-symbol sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub published_at: String,
    /// Sentiment score for the requested symbol, roughly in [-1, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    /// Provider-assigned sentiment label for the requested symbol
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_label: Option<String>,
}

/// MACD(12,26,9) triple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdTriple {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Latest values of the indicators the technical capability reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBundle {
    /// RSI(14)
    pub rsi: Option<f64>,
    /// MACD(12,26,9)
    pub macd: Option<MacdTriple>,
    /// SMA(50)
    pub sma: Option<f64>,
}

impl IndicatorBundle {
    /// True when no indicator could be determined
    pub fn is_empty(&self) -> bool {
        self.rsi.is_none() && self.macd.is_none() && self.sma.is_none()
    }
}

/// One dated indicator value, for the indicator passthrough
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub date: String,
    pub value: f64,
}

/// Company overview and fundamentals
///
/// The provider returns every field as a string ("None" or "-" for missing
/// data), so fields stay optional strings and rendering decides how to
/// present them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_cap: Option<String>,
    #[serde(rename = "PERatio")]
    pub pe_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio")]
    pub pb_ratio: Option<String>,
    #[serde(rename = "DividendYield")]
    pub dividend_yield: Option<String>,
    #[serde(rename = "EPS")]
    pub eps: Option<String>,
    #[serde(rename = "52WeekHigh")]
    pub week_52_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    pub week_52_low: Option<String>,
}
