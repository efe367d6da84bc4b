//! Per-run pipeline state
//!
//! One [`AnalysisState`] is created per analysis request, threaded by
//! exclusive reference through the stage sequence, and discarded after
//! result extraction. Stages write only their own slot and append a status
//! message; a stage failure is recorded in the slot and the run continues.

use crate::scoring::Scores;
use advisor_core::{
    ConversationTurn, KeyMetrics, Portfolio, Recommendation, SentimentLabel, TrendSignal,
};
use advisor_market::{CompanyOverview, DailyBar, IndicatorBundle, NewsItem, Quote};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Suggestion attached when the portfolio holds no position in the symbol
pub const WATCH_NOTE: &str = "可以考虑建立小仓位观察";

/// Outcome slot for one pipeline stage
///
/// Serializes as the payload itself, or as `{"error": ...}` when the stage
/// failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageData<T> {
    Ready(T),
    Failed { error: String },
}

impl<T> StageData<T> {
    /// The payload, when the stage succeeded
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Failed { .. } => None,
        }
    }

    /// Record a contained stage failure
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }
}

/// Raw payloads gathered by the collection stage
#[derive(Debug, Clone, Serialize)]
pub struct CollectedData {
    pub quote: Quote,
    /// Absent when the provider does not know the symbol
    pub overview: Option<CompanyOverview>,
    pub history: Vec<DailyBar>,
    pub collected_at: DateTime<Utc>,
}

/// Indicator conviction, strong when RSI sits in an extreme band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Strong,
    Moderate,
}

/// Reading derived from the latest indicator values
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalRead {
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
    pub trend: TrendSignal,
    pub strength: SignalStrength,
}

/// Raw indicators plus the derived reading
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalAssessment {
    pub indicators: IndicatorBundle,
    pub analysis: TechnicalRead,
}

/// Aggregate sentiment over the retained news items
#[derive(Debug, Clone, Serialize)]
pub struct SentimentSummary {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub average_score: f64,
    pub overall_sentiment: SentimentLabel,
}

/// Retained news items plus their aggregate sentiment
#[derive(Debug, Clone, Serialize)]
pub struct NewsAssessment {
    pub news_items: Vec<NewsItem>,
    pub sentiment_summary: SentimentSummary,
}

/// Position-aware context for the analyzed symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionContext {
    pub has_position: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl PositionContext {
    /// Context for a held position
    ///
    /// P&L is unknown when the current price is a degraded zero-valued
    /// placeholder; both P&L fields stay unset then so the scoring stage
    /// never reads a P&L derived from a zero price.
    pub fn held(shares: f64, avg_cost: f64, current_price: f64, total_value: f64) -> Self {
        let (unrealized_pnl, pnl_percentage) = if current_price <= 0.0 {
            (None, None)
        } else if avg_cost > 0.0 {
            let pnl = (current_price - avg_cost) * shares;
            (Some(pnl), Some((current_price - avg_cost) / avg_cost * 100.0))
        } else {
            (Some(current_price * shares), Some(0.0))
        };

        let position_percentage = if total_value > 0.0 {
            shares * current_price / total_value * 100.0
        } else {
            0.0
        };

        Self {
            has_position: true,
            position_size: Some(shares),
            avg_cost: Some(avg_cost),
            current_price: Some(current_price),
            unrealized_pnl,
            pnl_percentage,
            position_percentage: Some(position_percentage),
            recommendation: None,
        }
    }

    /// Context when the portfolio holds no position in the symbol
    pub fn watch() -> Self {
        Self {
            has_position: false,
            position_size: None,
            avg_cost: None,
            current_price: None,
            unrealized_pnl: None,
            pnl_percentage: None,
            position_percentage: None,
            recommendation: Some(WATCH_NOTE.to_string()),
        }
    }
}

/// Final synthesis written by the last stage
#[derive(Debug, Clone, Serialize)]
pub struct Synthesis {
    pub recommendation: Recommendation,
    pub confidence_score: f64,
    pub summary: String,
    pub detailed_scores: Scores,
    pub key_metrics: KeyMetrics,
}

/// Mutable record owned by one in-flight pipeline run
///
/// Later stages read slots written by earlier ones, so the stage order is
/// fixed and sequential within a run.
#[derive(Debug)]
pub struct AnalysisState {
    pub symbol: String,
    pub analysis_type: String,
    pub portfolio: Option<Portfolio>,
    /// Run transcript, seeded with the analysis request
    pub messages: Vec<ConversationTurn>,
    pub stock_data: Option<StageData<CollectedData>>,
    pub technical_data: Option<StageData<TechnicalAssessment>>,
    pub news_data: Option<StageData<NewsAssessment>>,
    pub portfolio_context: Option<StageData<PositionContext>>,
    pub analysis_result: Option<StageData<Synthesis>>,
    pub recommendation: Option<Recommendation>,
    pub confidence_score: f64,
}

impl AnalysisState {
    /// Fresh state for one run; every slot starts empty
    pub fn new(
        symbol: impl Into<String>,
        analysis_type: impl Into<String>,
        portfolio: Option<Portfolio>,
        seed: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            analysis_type: analysis_type.into(),
            portfolio,
            messages: vec![ConversationTurn::human(seed)],
            stock_data: None,
            technical_data: None,
            news_data: None,
            portfolio_context: None,
            analysis_result: None,
            recommendation: None,
            confidence_score: 0.0,
        }
    }

    /// Append one status message to the run transcript
    pub fn push_status(&mut self, message: impl Into<String>) {
        self.messages.push(ConversationTurn::assistant(message));
    }

    /// Transcript contents in order
    pub fn message_texts(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|turn| turn.content.clone())
            .collect()
    }

    /// The portfolio stage runs only when the caller supplied a portfolio
    /// with at least one position
    pub fn should_analyze_portfolio(&self) -> bool {
        self.portfolio.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Successfully collected payloads, if the collection stage produced any
    pub fn collected(&self) -> Option<&CollectedData> {
        self.stock_data.as_ref().and_then(StageData::ready)
    }

    /// Derived technical reading, when available
    pub fn technical_read(&self) -> Option<&TechnicalRead> {
        self.technical_data
            .as_ref()
            .and_then(StageData::ready)
            .map(|assessment| &assessment.analysis)
    }

    /// Aggregate news sentiment, when available
    pub fn sentiment_summary(&self) -> Option<&SentimentSummary> {
        self.news_data
            .as_ref()
            .and_then(StageData::ready)
            .map(|assessment| &assessment.sentiment_summary)
    }

    /// Position context, when the portfolio stage ran and succeeded
    pub fn position(&self) -> Option<&PositionContext> {
        self.portfolio_context.as_ref().and_then(StageData::ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::Position;
    use serde_json::json;
    use std::collections::HashMap;

    fn portfolio_with(symbol: &str, shares: f64, avg_cost: f64) -> Portfolio {
        let mut positions = HashMap::new();
        positions.insert(symbol.to_string(), Position { shares, avg_cost });
        Portfolio {
            total_value: 50_000.0,
            positions,
        }
    }

    #[test]
    fn test_stage_data_serialization() {
        let ready: StageData<Vec<u32>> = StageData::Ready(vec![1, 2]);
        assert_eq!(serde_json::to_value(&ready).unwrap(), json!([1, 2]));

        let failed: StageData<Vec<u32>> = StageData::failed("quota exhausted");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"error": "quota exhausted"})
        );
        assert!(failed.ready().is_none());
    }

    #[test]
    fn test_held_position_pnl() {
        let ctx = PositionContext::held(10.0, 80.0, 100.0, 50_000.0);
        assert!(ctx.has_position);
        assert_eq!(ctx.unrealized_pnl, Some(200.0));
        assert_eq!(ctx.pnl_percentage, Some(25.0));
        let pct = ctx.position_percentage.unwrap();
        assert!((pct - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_held_position_zero_price_suppresses_pnl() {
        let ctx = PositionContext::held(10.0, 80.0, 0.0, 50_000.0);
        assert!(ctx.pnl_percentage.is_none());
        assert!(ctx.unrealized_pnl.is_none());
        assert_eq!(ctx.current_price, Some(0.0));
    }

    #[test]
    fn test_held_position_zero_cost() {
        let ctx = PositionContext::held(10.0, 0.0, 100.0, 50_000.0);
        assert_eq!(ctx.pnl_percentage, Some(0.0));
    }

    #[test]
    fn test_watch_context_serialization() {
        let value = serde_json::to_value(PositionContext::watch()).unwrap();
        assert_eq!(
            value,
            json!({"has_position": false, "recommendation": WATCH_NOTE})
        );
    }

    #[test]
    fn test_portfolio_gate() {
        let state = AnalysisState::new("AAPL", "comprehensive", None, "分析 AAPL");
        assert!(!state.should_analyze_portfolio());

        let empty = Portfolio {
            total_value: 10_000.0,
            positions: HashMap::new(),
        };
        let state = AnalysisState::new("AAPL", "comprehensive", Some(empty), "分析 AAPL");
        assert!(!state.should_analyze_portfolio());

        let held = portfolio_with("AAPL", 10.0, 80.0);
        let state = AnalysisState::new("AAPL", "comprehensive", Some(held), "分析 AAPL");
        assert!(state.should_analyze_portfolio());
    }

    #[test]
    fn test_transcript_is_append_only_and_seeded() {
        let mut state = AnalysisState::new("AAPL", "comprehensive", None, "请分析 AAPL");
        state.push_status("成功收集 AAPL 的基础数据");
        state.push_status("技术分析完成: AAPL");

        let texts = state.message_texts();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0], "请分析 AAPL");
        assert_eq!(texts[2], "技术分析完成: AAPL");
    }
}
