//! News and sentiment capability

use advisor_core::Result as CoreResult;
use advisor_llm::tools::schema;
use advisor_market::{MarketData, NewsItem};
use advisor_tools::{Tool, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 5;
const SUMMARY_CHARS: usize = 100;
const SENTIMENT_THRESHOLD: f64 = 0.15;

/// Fetches recent news with per-item and aggregate sentiment
pub struct StockNewsTool {
    market: Arc<dyn MarketData>,
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    symbol: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl StockNewsTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }

    /// Mean of the available per-item scores; 0 when none carry one
    fn average_score(items: &[NewsItem]) -> f64 {
        let scores: Vec<f64> = items.iter().filter_map(|item| item.sentiment_score).collect();
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    fn aggregate_label(average: f64) -> &'static str {
        if average > SENTIMENT_THRESHOLD {
            "正面"
        } else if average < -SENTIMENT_THRESHOLD {
            "负面"
        } else {
            "中性"
        }
    }

    fn render(symbol: &str, items: &[NewsItem]) -> String {
        let average = Self::average_score(items);
        let label = Self::aggregate_label(average);

        let lines: Vec<String> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let summary: String = item.summary.chars().take(SUMMARY_CHARS).collect();
                let headline = match &item.sentiment_label {
                    Some(item_label) => format!("{}. 【{item_label}】{}", idx + 1, item.title),
                    None => format!("{}. {}", idx + 1, item.title),
                };
                format!("{headline}\n   时间: {}\n   摘要: {summary}...", item.published_at)
            })
            .collect();

        format!(
            "📰 {symbol} 最新新闻（共{}条）：\n\n整体情感: {label} (评分: {average:.3})\n\n{}",
            items.len(),
            lines.join("\n"),
        )
    }
}

#[async_trait]
impl Tool for StockNewsTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutput> {
        let params: NewsParams = serde_json::from_value(params).map_err(|e| {
            advisor_core::Error::ProcessingFailed(format!("Invalid parameters: {e}"))
        })?;
        let symbol = params.symbol.to_uppercase();

        match self.market.news(&symbol, params.limit).await {
            Ok(items) if !items.is_empty() => {
                let text = Self::render(&symbol, &items);
                let data = json!({
                    "news_items": items,
                    "average_score": Self::average_score(&items),
                });
                Ok(ToolOutput::new(text, data))
            }
            Ok(_) => Ok(ToolOutput::new(
                format!("未找到股票 {symbol} 的相关新闻"),
                json!({"error": "no news found"}),
            )),
            Err(e) => Ok(ToolOutput::new(
                format!("错误: {e}"),
                json!({"error": e.to_string()}),
            )),
        }
    }

    fn name(&self) -> &str {
        "get_news"
    }

    fn description(&self) -> &str {
        "获取股票相关的最新新闻和情感分析，返回新闻列表和整体情感评分"
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "symbol": schema::string("股票代码"),
                "limit": schema::integer("返回新闻数量，默认5条"),
            }),
            vec!["symbol"],
        )
    }
}
