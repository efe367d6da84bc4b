//! Shared domain model: recommendations, portfolios, conversation turns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Final recommendation label for an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Buy => write!(f, "BUY"),
            Recommendation::Sell => write!(f, "SELL"),
            Recommendation::Hold => write!(f, "HOLD"),
        }
    }
}

/// Direction extracted from technical indicators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSignal {
    Bullish,
    Bearish,
    #[default]
    Unknown,
}

impl fmt::Display for TrendSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendSignal::Bullish => write!(f, "bullish"),
            TrendSignal::Bearish => write!(f, "bearish"),
            TrendSignal::Unknown => write!(f, "unknown"),
        }
    }
}

/// Aggregate news sentiment label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
        }
    }
}

/// A single held position inside a caller-supplied portfolio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Number of shares held (non-negative)
    pub shares: f64,
    /// Average acquisition cost per share (non-negative)
    pub avg_cost: f64,
}

/// Caller-supplied portfolio snapshot
///
/// Immutable input. The engine reads it to decide whether the pipeline's
/// portfolio stage runs and to weight the final score; it never mutates or
/// persists it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Total portfolio value across all positions
    pub total_value: f64,
    /// Positions keyed by ticker symbol
    pub positions: HashMap<String, Position>,
}

impl Portfolio {
    /// Look up a position by symbol, ignoring ASCII case
    pub fn position_for(&self, symbol: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(symbol))
            .map(|(_, position)| position)
    }

    /// True when the portfolio carries no positions at all
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Structured metrics recovered alongside the recommendation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub trend: TrendSignal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    pub sentiment: SentimentLabel,
    pub has_position: bool,
}

/// Result of one completed analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub analysis_type: String,
    pub recommendation: Recommendation,
    pub confidence_score: f64,
    pub summary: String,
    pub key_metrics: KeyMetrics,
    /// Full raw trace (transcript, per-stage payloads) when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_analysis: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    /// Create a result stamped with the current time; confidence is clamped
    /// to [0, 1]
    pub fn new(
        symbol: impl Into<String>,
        analysis_type: impl Into<String>,
        recommendation: Recommendation,
        confidence_score: f64,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            analysis_type: analysis_type.into(),
            recommendation,
            confidence_score: confidence_score.clamp(0.0, 1.0),
            summary: summary.into(),
            key_metrics: KeyMetrics::default(),
            detailed_analysis: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_key_metrics(mut self, key_metrics: KeyMetrics) -> Self {
        self.key_metrics = key_metrics;
        self
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detailed_analysis = Some(detail);
        self
    }
}

/// Reply to a follow-up chat question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Role tag on a stored conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Human,
    Assistant,
    Tool,
}

/// One role-tagged message in a per-symbol conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Tool,
            content: content.into(),
        }
    }
}

/// One tool invocation recorded while the agentic loop runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub tool: String,
    pub input: Value,
    /// Tool output, truncated for the trace
    pub output: String,
}
