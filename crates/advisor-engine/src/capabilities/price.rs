//! Real-time price snapshot capability

use advisor_core::Result as CoreResult;
use advisor_llm::tools::schema;
use advisor_market::{MarketData, Quote};
use advisor_tools::{Tool, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Fetches the current quote and renders it as a bilingual report
pub struct StockPriceTool {
    market: Arc<dyn MarketData>,
}

#[derive(Debug, Deserialize)]
struct PriceParams {
    symbol: String,
}

impl StockPriceTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }

    fn render(quote: &Quote) -> String {
        format!(
            "📊 {} 实时行情：
- 当前价格: ${:.2}
- 涨跌幅: {:.2}%
- 涨跌额: ${:.2}
- 开盘价: ${:.2}
- 最高价: ${:.2}
- 最低价: ${:.2}
- 成交量: {}
- 最新交易日: {}",
            quote.symbol,
            quote.price,
            quote.change_percent,
            quote.change,
            quote.open,
            quote.high,
            quote.low,
            quote.volume,
            quote.latest_trading_day,
        )
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutput> {
        let params: PriceParams = serde_json::from_value(params).map_err(|e| {
            advisor_core::Error::ProcessingFailed(format!("Invalid parameters: {e}"))
        })?;
        let symbol = params.symbol.to_uppercase();

        match self.market.quote(&symbol).await {
            Ok(quote) if !quote.is_placeholder() => {
                let text = Self::render(&quote);
                let data = serde_json::to_value(&quote).unwrap_or(Value::Null);
                Ok(ToolOutput::new(text, data))
            }
            Ok(_) => Ok(ToolOutput::new(
                format!("未找到股票 {symbol} 的数据"),
                json!({"error": "no quote data"}),
            )),
            Err(e) => Ok(ToolOutput::new(
                format!("错误: {e}"),
                json!({"error": e.to_string()}),
            )),
        }
    }

    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "获取股票的实时价格和基本信息，包含当前价格、涨跌幅、成交量等"
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "symbol": schema::string("股票代码，如 'AAPL', 'TSLA', 'MSFT'"),
            }),
            vec!["symbol"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::tests::StubMarket;

    #[test]
    fn test_render_report() {
        let quote = Quote {
            symbol: "AAPL".to_string(),
            price: 187.30,
            open: 186.06,
            high: 188.45,
            low: 185.83,
            volume: 53_003_912,
            change: 2.73,
            change_percent: 1.4791,
            latest_trading_day: "2024-05-10".to_string(),
        };

        let text = StockPriceTool::render(&quote);
        assert!(text.starts_with("📊 AAPL 实时行情："));
        assert!(text.contains("- 当前价格: $187.30"));
        assert!(text.contains("- 涨跌幅: 1.48%"));
        assert!(text.contains("- 成交量: 53003912"));
        assert!(text.contains("- 最新交易日: 2024-05-10"));
    }

    #[tokio::test]
    async fn test_execute_returns_report_and_data() {
        let market = Arc::new(StubMarket::healthy());
        let tool = StockPriceTool::new(market);

        let output = tool.execute(json!({"symbol": "aapl"})).await.unwrap();
        assert!(output.text.contains("AAPL 实时行情"));
        assert_eq!(output.data["symbol"], "AAPL");
    }

    #[tokio::test]
    async fn test_execute_placeholder_quote_reports_missing_data() {
        let market = Arc::new(StubMarket::empty());
        let tool = StockPriceTool::new(market);

        let output = tool.execute(json!({"symbol": "ZZZZ"})).await.unwrap();
        assert_eq!(output.text, "未找到股票 ZZZZ 的数据");
        assert!(output.data["error"].is_string());
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_params() {
        let market = Arc::new(StubMarket::healthy());
        let tool = StockPriceTool::new(market);

        assert!(tool.execute(json!({"ticker": "AAPL"})).await.is_err());
    }

    #[test]
    fn test_metadata() {
        let tool = StockPriceTool::new(Arc::new(StubMarket::healthy()));
        assert_eq!(tool.name(), "get_stock_price");
        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["symbol"]));
    }
}
