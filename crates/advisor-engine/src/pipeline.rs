//! Deterministic multi-stage analysis pipeline
//!
//! Fixed stage order over one per-run [`AnalysisState`]: data collection,
//! technical analysis, news sentiment, an optional portfolio stage, then
//! synthesis. Later stages read slots written by earlier ones, so the order
//! is not negotiable. A stage failure is contained in its own slot and the
//! run always reaches synthesis.

use crate::error::{EngineError, Result};
use crate::prompts;
use crate::scoring::{self, Scores};
use crate::state::{
    AnalysisState, CollectedData, NewsAssessment, PositionContext, SentimentSummary,
    SignalStrength, StageData, Synthesis, TechnicalAssessment, TechnicalRead,
};
use crate::transcript::{RunRecord, TranscriptLog};
use advisor_core::{AnalysisResult, KeyMetrics, Portfolio, SentimentLabel, TrendSignal};
use advisor_market::{IndicatorBundle, MarketData, MarketError, NewsItem};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// News items retained for sentiment aggregation
const NEWS_RETAINED: usize = 10;
/// Per-item sentiment classification threshold
const ITEM_THRESHOLD: f64 = 0.15;
/// Aggregate sentiment classification threshold
const OVERALL_THRESHOLD: f64 = 0.1;
/// RSI level separating a bullish from a bearish read
const RSI_TREND_LEVEL: f64 = 50.0;
/// RSI extremes treated as a strong signal
const RSI_UPPER_BAND: f64 = 70.0;
const RSI_LOWER_BAND: f64 = 30.0;

/// Fixed-formula analysis over market data; no reasoning service involved
pub struct PipelineAnalyzer {
    market: Arc<dyn MarketData>,
    log: TranscriptLog,
}

impl PipelineAnalyzer {
    pub fn new(market: Arc<dyn MarketData>, log: TranscriptLog) -> Self {
        Self { market, log }
    }

    /// Run the full stage sequence for one symbol
    #[instrument(skip(self, portfolio))]
    pub async fn analyze(
        &self,
        symbol: &str,
        analysis_type: &str,
        portfolio: Option<Portfolio>,
    ) -> Result<AnalysisResult> {
        let symbol = symbol.to_uppercase();
        info!(%symbol, analysis_type, "starting pipeline analysis");

        let seed = prompts::pipeline_seed(&symbol, portfolio.as_ref());
        let mut state = AnalysisState::new(&symbol, analysis_type, portfolio, seed);

        self.collect_stock_data(&mut state).await;
        self.perform_technical_analysis(&mut state).await;
        self.analyze_news_sentiment(&mut state).await;
        if state.should_analyze_portfolio() {
            Self::analyze_portfolio_context(&mut state);
        }
        Self::synthesize_recommendation(&mut state);

        let messages = state.message_texts();
        let result = Self::extract_result(state)?;
        self.record_run(&result, messages);
        info!(
            %symbol,
            recommendation = %result.recommendation,
            confidence = result.confidence_score,
            "pipeline analysis finished"
        );
        Ok(result)
    }

    async fn collect_stock_data(&self, state: &mut AnalysisState) {
        let symbol = state.symbol.clone();

        match self.fetch_collected(&symbol).await {
            Ok(collected) => {
                state.stock_data = Some(StageData::Ready(collected));
                state.push_status(format!("成功收集 {symbol} 的基础数据"));
            }
            Err(e) => {
                warn!(%symbol, error = %e, "data collection failed");
                state.push_status(format!("数据收集失败: {e}"));
                state.stock_data = Some(StageData::failed(e));
            }
        }
    }

    /// Quote, overview and history in one pass; a symbol unknown to the
    /// overview endpoint or an empty history is tolerated, transport
    /// failures are not
    async fn fetch_collected(&self, symbol: &str) -> advisor_market::Result<CollectedData> {
        let quote = self.market.quote(symbol).await?;

        let overview = match self.market.company_overview(symbol).await {
            Ok(overview) => Some(overview),
            Err(MarketError::InvalidSymbol(_)) => None,
            Err(e) => return Err(e),
        };

        let history = match self.market.daily_history(symbol).await {
            Ok(history) => history,
            Err(MarketError::DataUnavailable { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        Ok(CollectedData {
            quote,
            overview,
            history,
            collected_at: Utc::now(),
        })
    }

    async fn perform_technical_analysis(&self, state: &mut AnalysisState) {
        let symbol = state.symbol.clone();

        match self.market.indicators(&symbol).await {
            Ok(bundle) => {
                let analysis = Self::derive_technical_read(&bundle);
                state.technical_data = Some(StageData::Ready(TechnicalAssessment {
                    indicators: bundle,
                    analysis,
                }));
                state.push_status(format!("技术分析完成: {symbol}"));
            }
            Err(e) => {
                warn!(%symbol, error = %e, "technical analysis failed");
                state.push_status(format!("技术分析失败: {e}"));
                state.technical_data = Some(StageData::failed(e));
            }
        }
    }

    fn derive_technical_read(bundle: &IndicatorBundle) -> TechnicalRead {
        // RSI decides the trend when present; the MACD histogram sign is
        // the fallback read
        let trend = match (bundle.rsi, bundle.macd) {
            (Some(rsi), _) if rsi > RSI_TREND_LEVEL => TrendSignal::Bullish,
            (Some(_), _) => TrendSignal::Bearish,
            (None, Some(macd)) if macd.histogram > 0.0 => TrendSignal::Bullish,
            (None, Some(_)) => TrendSignal::Bearish,
            (None, None) => TrendSignal::Unknown,
        };

        let strength = match bundle.rsi {
            Some(rsi) if rsi > RSI_UPPER_BAND || rsi < RSI_LOWER_BAND => SignalStrength::Strong,
            _ => SignalStrength::Moderate,
        };

        TechnicalRead {
            sma: bundle.sma,
            rsi: bundle.rsi,
            trend,
            strength,
        }
    }

    async fn analyze_news_sentiment(&self, state: &mut AnalysisState) {
        let symbol = state.symbol.clone();

        match self.market.news(&symbol, NEWS_RETAINED).await {
            Ok(items) => {
                let sentiment_summary = Self::summarize_sentiment(&items);
                state.news_data = Some(StageData::Ready(NewsAssessment {
                    news_items: items,
                    sentiment_summary,
                }));
                state.push_status(format!("新闻情感分析完成: {symbol}"));
            }
            Err(e) => {
                warn!(%symbol, error = %e, "news sentiment analysis failed");
                state.push_status(format!("新闻情感分析失败: {e}"));
                state.news_data = Some(StageData::failed(e));
            }
        }
    }

    fn summarize_sentiment(items: &[NewsItem]) -> SentimentSummary {
        let mut positive = 0;
        let mut negative = 0;
        let mut neutral = 0;
        let mut scores = Vec::new();

        for item in items {
            match item.sentiment_score {
                Some(score) => {
                    scores.push(score);
                    if score > ITEM_THRESHOLD {
                        positive += 1;
                    } else if score < -ITEM_THRESHOLD {
                        negative += 1;
                    } else {
                        neutral += 1;
                    }
                }
                None => neutral += 1,
            }
        }

        let average_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        let overall_sentiment = if average_score > OVERALL_THRESHOLD {
            SentimentLabel::Positive
        } else if average_score < -OVERALL_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        SentimentSummary {
            positive,
            negative,
            neutral,
            average_score,
            overall_sentiment,
        }
    }

    /// Runs only when the caller supplied a portfolio with positions; the
    /// symbol may still be absent from it
    fn analyze_portfolio_context(state: &mut AnalysisState) {
        let symbol = state.symbol.clone();
        let current_price = state.collected().map_or(0.0, |data| data.quote.price);

        let context = match &state.portfolio {
            Some(portfolio) => match portfolio.position_for(&symbol) {
                Some(position) => PositionContext::held(
                    position.shares,
                    position.avg_cost,
                    current_price,
                    portfolio.total_value,
                ),
                None => PositionContext::watch(),
            },
            None => PositionContext::watch(),
        };

        state.portfolio_context = Some(StageData::Ready(context));
        state.push_status(format!("投资组合分析完成: {symbol}"));
    }

    fn synthesize_recommendation(state: &mut AnalysisState) {
        let symbol = state.symbol.clone();

        let trend = state.technical_read().map(|read| read.trend);
        let rsi = state.technical_read().and_then(|read| read.rsi);
        let average_score = state.sentiment_summary().map(|s| s.average_score);
        let overall_sentiment = state.sentiment_summary().map(|s| s.overall_sentiment);
        let has_position = state.position().is_some_and(|p| p.has_position);
        let pnl_percentage = state.position().and_then(|p| p.pnl_percentage);

        let technical_score = trend.map_or(0.0, scoring::score_technical);
        let sentiment_score = average_score.unwrap_or(0.0);
        let portfolio_score = if has_position {
            scoring::score_portfolio(pnl_percentage)
        } else {
            0.0
        };

        let scores = Scores::new(technical_score, sentiment_score, portfolio_score);
        let (recommendation, confidence) = scoring::classify(scores.total);

        let mut parts = Vec::new();
        if let Some(trend) = trend {
            parts.push(format!("技术分析显示{trend}趋势"));
        }
        if let Some(sentiment) = overall_sentiment {
            parts.push(format!("市场情绪为{sentiment}"));
        }
        if has_position {
            parts.push(format!(
                "当前持仓盈亏{:.1}%",
                pnl_percentage.unwrap_or(0.0)
            ));
        }
        let summary = if parts.is_empty() {
            "综合分析显示中性信号".to_string()
        } else {
            parts.join("；")
        };

        let key_metrics = KeyMetrics {
            trend: trend.unwrap_or(TrendSignal::Unknown),
            rsi,
            sentiment: overall_sentiment.unwrap_or(SentimentLabel::Neutral),
            has_position,
        };

        state.recommendation = Some(recommendation);
        state.confidence_score = confidence;
        state.analysis_result = Some(StageData::Ready(Synthesis {
            recommendation,
            confidence_score: confidence,
            summary,
            detailed_scores: scores,
            key_metrics,
        }));
        state.push_status(format!("综合分析完成: {symbol} - {recommendation}"));
    }

    /// Fold the terminal state into the caller-facing result and persist
    /// the run record
    fn extract_result(state: AnalysisState) -> Result<AnalysisResult> {
        let Some(StageData::Ready(synthesis)) = &state.analysis_result else {
            return Err(EngineError::AnalysisFailed {
                symbol: state.symbol,
                reason: "synthesis stage did not run".to_string(),
            });
        };

        let mut detail = json!({
            "symbol": state.symbol,
            "recommendation": synthesis.recommendation,
            "confidence_score": synthesis.confidence_score,
            "summary": synthesis.summary,
            "detailed_scores": synthesis.detailed_scores,
            "key_metrics": synthesis.key_metrics,
        });
        let news_value = state
            .news_data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        if let Some(news) = &news_value {
            detail["news_data"] = news.clone();
        }

        Ok(AnalysisResult::new(
            &state.symbol,
            &state.analysis_type,
            synthesis.recommendation,
            synthesis.confidence_score,
            &synthesis.summary,
        )
        .with_key_metrics(synthesis.key_metrics.clone())
        .with_detail(detail))
    }

    /// Persist the run record for a finished analysis
    fn record_run(&self, result: &AnalysisResult, messages: Vec<String>) {
        let news_value = result
            .detailed_analysis
            .as_ref()
            .and_then(|detail| detail.get("news_data"))
            .cloned();
        let record = RunRecord::from_stages(&result.symbol, &result.summary, messages, news_value);
        self.log.save(&record);
    }
}
