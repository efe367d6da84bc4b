//! Heuristic parser recovering structured fields from free-form model output
//!
//! The agentic strategy gets back natural language; this module turns it into
//! the same structured result the pipeline produces. Output is best-effort,
//! never authoritative: every extraction has a default.

use advisor_core::{KeyMetrics, Recommendation, SentimentLabel, TraceStep, TrendSignal};
use regex::Regex;

const SELL_KEYWORDS: [&str; 7] = ["卖出", "sell", "建议卖出", "减仓", "止盈", "离场", "抛售"];
const BUY_KEYWORDS: [&str; 7] = ["买入", "buy", "建议购买", "可以买", "适合买入", "建立仓位", "增持"];
const HOLD_KEYWORDS: [&str; 6] = ["持有", "hold", "观望", "等待", "维持", "保持"];

const CONFIDENCE_PATTERNS: [&str; 4] = [
    r"(?i)置信度[：:]\s*(\d+(?:\.\d+)?)\s*%",
    r"(?i)confidence[：:]\s*(\d+(?:\.\d+)?)\s*%",
    r"(?i)(\d+(?:\.\d+)?)\s*%\s*置信度",
    r"(?i)(\d+(?:\.\d+)?)\s*%\s*confidence",
];

const RSI_PATTERN: &str = r"RSI\(14\):\s*(\d+(?:\.\d+)?)";

/// Parsed structured fields from one agentic run
#[derive(Debug, Clone)]
pub struct ParsedResult {
    pub recommendation: Recommendation,
    pub confidence_score: f64,
    pub key_metrics: KeyMetrics,
}

/// Heuristic parser over final answers and tool traces
pub struct ResultParser;

impl ResultParser {
    /// Parse a run's final answer plus its tool trace
    pub fn parse(final_answer: &str, steps: &[TraceStep]) -> ParsedResult {
        ParsedResult {
            recommendation: Self::parse_recommendation(final_answer),
            confidence_score: Self::parse_confidence(final_answer),
            key_metrics: Self::extract_key_metrics(steps),
        }
    }

    /// Keyword scan with fixed priority SELL > BUY > HOLD
    pub fn parse_recommendation(text: &str) -> Recommendation {
        let text = text.to_lowercase();

        if SELL_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
            return Recommendation::Sell;
        }
        if BUY_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
            return Recommendation::Buy;
        }
        if HOLD_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
            return Recommendation::Hold;
        }

        Recommendation::Hold
    }

    /// Extract a confidence in [0, 1] from an explicit percentage, falling
    /// back to intensity-of-language buckets
    pub fn parse_confidence(text: &str) -> f64 {
        for pattern in CONFIDENCE_PATTERNS {
            if let Ok(regex) = Regex::new(pattern) {
                if let Some(captures) = regex.captures(text) {
                    if let Ok(percent) = captures[1].parse::<f64>() {
                        return (percent / 100.0).min(1.0);
                    }
                }
            }
        }

        let text = text.to_lowercase();
        if ["强烈", "非常", "strongly", "highly"]
            .iter()
            .any(|word| text.contains(word))
        {
            return 0.85;
        }
        if ["建议", "recommend", "应该"]
            .iter()
            .any(|word| text.contains(word))
        {
            return 0.75;
        }
        if ["可能", "may", "might", "或许"]
            .iter()
            .any(|word| text.contains(word))
        {
            return 0.60;
        }

        0.70
    }

    /// Scan tool outputs for RSI, crossover direction, and aggregate
    /// sentiment; last seen wins when a capability ran more than once
    pub fn extract_key_metrics(steps: &[TraceStep]) -> KeyMetrics {
        let mut metrics = KeyMetrics::default();
        let rsi_regex = Regex::new(RSI_PATTERN).ok();

        for step in steps {
            let output = &step.output;

            if let Some(captures) = rsi_regex.as_ref().and_then(|regex| regex.captures(output)) {
                if let Ok(rsi) = captures[1].parse::<f64>() {
                    metrics.rsi = Some(rsi);
                }
            }

            if output.contains("金叉") || output.contains("看涨") {
                metrics.trend = TrendSignal::Bullish;
            } else if output.contains("死叉") || output.contains("看跌") {
                metrics.trend = TrendSignal::Bearish;
            }

            if output.contains("整体情感: 正面") {
                metrics.sentiment = SentimentLabel::Positive;
            } else if output.contains("整体情感: 负面") {
                metrics.sentiment = SentimentLabel::Negative;
            }
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(output: &str) -> TraceStep {
        TraceStep {
            tool: "calculate_indicators".to_string(),
            input: json!({"symbol": "AAPL"}),
            output: output.to_string(),
        }
    }

    #[test]
    fn test_recommendation_keywords() {
        assert_eq!(
            ResultParser::parse_recommendation("综合来看，建议买入该股票"),
            Recommendation::Buy
        );
        assert_eq!(
            ResultParser::parse_recommendation("I would SELL this position"),
            Recommendation::Sell
        );
        assert_eq!(
            ResultParser::parse_recommendation("建议继续观望"),
            Recommendation::Hold
        );
        assert_eq!(
            ResultParser::parse_recommendation("no signal here"),
            Recommendation::Hold
        );
    }

    #[test]
    fn test_sell_outranks_buy_for_any_input() {
        // Priority is SELL > BUY > HOLD even when both phrasings appear
        let mixed = [
            "短期可以买入，但长期建议卖出",
            "buy now? no, sell and wait",
            "适合买入后逐步减仓",
        ];
        for text in mixed {
            assert_eq!(
                ResultParser::parse_recommendation(text),
                Recommendation::Sell,
                "expected SELL for {text:?}"
            );
        }
    }

    #[test]
    fn test_confidence_percentage_forms() {
        assert!((ResultParser::parse_confidence("置信度：85%") - 0.85).abs() < 1e-9);
        assert!((ResultParser::parse_confidence("置信度: 72.5%") - 0.725).abs() < 1e-9);
        assert!((ResultParser::parse_confidence("Confidence: 60%") - 0.60).abs() < 1e-9);
        assert!((ResultParser::parse_confidence("80% 置信度") - 0.80).abs() < 1e-9);
        assert!((ResultParser::parse_confidence("90% confidence") - 0.90).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_clamped_to_one() {
        assert!((ResultParser::parse_confidence("confidence: 250%") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_intensity_buckets() {
        assert!((ResultParser::parse_confidence("强烈看好这只股票") - 0.85).abs() < 1e-9);
        assert!((ResultParser::parse_confidence("建议关注后续走势") - 0.75).abs() < 1e-9);
        assert!((ResultParser::parse_confidence("后市可能走高") - 0.60).abs() < 1e-9);
        assert!((ResultParser::parse_confidence("中性信号") - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_percentage_beats_buckets() {
        // 强烈 alone would give 0.85; the explicit figure wins
        let text = "强烈建议买入，置信度：65%";
        assert!((ResultParser::parse_confidence(text) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_key_metrics_extraction() {
        let steps = vec![
            step("📈 AAPL 技术指标分析：\n\n- RSI(14): 55.50 (正常)\n- MACD: 1.2000, Signal: 0.8000, Hist: 0.4000 (金叉(看涨))"),
            step("📰 AAPL 最新新闻（共12条）：\n\n整体情感: 正面 (评分: 0.230)"),
        ];

        let metrics = ResultParser::extract_key_metrics(&steps);
        assert_eq!(metrics.rsi, Some(55.50));
        assert_eq!(metrics.trend, TrendSignal::Bullish);
        assert_eq!(metrics.sentiment, SentimentLabel::Positive);
        assert!(!metrics.has_position);
    }

    #[test]
    fn test_key_metrics_last_seen_wins() {
        let steps = vec![
            step("- RSI(14): 75.00 (超买)\n- MACD: 0.1, Signal: 0.2, Hist: -0.1 (死叉(看跌))"),
            step("- RSI(14): 42.00 (正常)\n- MACD: 0.3, Signal: 0.1, Hist: 0.2 (金叉(看涨))"),
        ];

        let metrics = ResultParser::extract_key_metrics(&steps);
        assert_eq!(metrics.rsi, Some(42.0));
        assert_eq!(metrics.trend, TrendSignal::Bullish);
    }

    #[test]
    fn test_key_metrics_defaults_when_nothing_matches() {
        let metrics = ResultParser::extract_key_metrics(&[step("错误: 请求失败")]);
        assert_eq!(metrics.trend, TrendSignal::Unknown);
        assert!(metrics.rsi.is_none());
        assert_eq!(metrics.sentiment, SentimentLabel::Neutral);
    }
}
