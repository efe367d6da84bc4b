//! Technical indicator capability

use advisor_core::Result as CoreResult;
use advisor_llm::tools::schema;
use advisor_market::{IndicatorBundle, MarketData};
use advisor_tools::{Tool, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Reports RSI(14), MACD(12,26,9) and SMA(50) for a symbol
pub struct TechnicalIndicatorsTool {
    market: Arc<dyn MarketData>,
}

#[derive(Debug, Deserialize)]
struct TechnicalParams {
    symbol: String,
}

impl TechnicalIndicatorsTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }

    fn render(symbol: &str, bundle: &IndicatorBundle) -> String {
        let mut lines = Vec::new();

        if let Some(rsi) = bundle.rsi {
            let status = if rsi > RSI_OVERBOUGHT {
                "超买"
            } else if rsi < RSI_OVERSOLD {
                "超卖"
            } else {
                "正常"
            };
            lines.push(format!("- RSI(14): {rsi:.2} ({status})"));
        }

        if let Some(macd) = bundle.macd {
            let cross = if macd.histogram > 0.0 {
                "金叉(看涨)"
            } else {
                "死叉(看跌)"
            };
            lines.push(format!(
                "- MACD: {:.4}, Signal: {:.4}, Hist: {:.4} ({cross})",
                macd.macd, macd.signal, macd.histogram,
            ));
        }

        if let Some(sma) = bundle.sma {
            lines.push(format!("- SMA(50): ${sma:.2}"));
        }

        format!("📈 {symbol} 技术指标分析：\n\n{}", lines.join("\n"))
    }
}

#[async_trait]
impl Tool for TechnicalIndicatorsTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutput> {
        let params: TechnicalParams = serde_json::from_value(params).map_err(|e| {
            advisor_core::Error::ProcessingFailed(format!("Invalid parameters: {e}"))
        })?;
        let symbol = params.symbol.to_uppercase();

        match self.market.indicators(&symbol).await {
            Ok(bundle) if !bundle.is_empty() => {
                let text = Self::render(&symbol, &bundle);
                let data = serde_json::to_value(bundle).unwrap_or(Value::Null);
                Ok(ToolOutput::new(text, data))
            }
            Ok(_) => Ok(ToolOutput::new(
                format!("无法获取 {symbol} 的技术指标数据"),
                json!({"error": "no indicator data"}),
            )),
            Err(e) => Ok(ToolOutput::new(
                format!("错误: {e}"),
                json!({"error": e.to_string()}),
            )),
        }
    }

    fn name(&self) -> &str {
        "calculate_indicators"
    }

    fn description(&self) -> &str {
        "计算股票的关键技术指标，包含RSI、MACD、移动平均线等"
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "symbol": schema::string("股票代码"),
            }),
            vec!["symbol"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::tests::StubMarket;
    use advisor_market::MacdTriple;

    #[test]
    fn test_render_full_bundle() {
        let bundle = IndicatorBundle {
            rsi: Some(72.5),
            macd: Some(MacdTriple {
                macd: 1.2345,
                signal: 1.1,
                histogram: 0.1345,
            }),
            sma: Some(180.5),
        };

        let text = TechnicalIndicatorsTool::render("AAPL", &bundle);
        assert!(text.starts_with("📈 AAPL 技术指标分析：\n\n"));
        assert!(text.contains("- RSI(14): 72.50 (超买)"));
        assert!(text.contains("- MACD: 1.2345, Signal: 1.1000, Hist: 0.1345 (金叉(看涨))"));
        assert!(text.contains("- SMA(50): $180.50"));
    }

    #[test]
    fn test_render_rsi_bands() {
        let oversold = IndicatorBundle {
            rsi: Some(25.0),
            ..IndicatorBundle::default()
        };
        assert!(TechnicalIndicatorsTool::render("AAPL", &oversold).contains("(超卖)"));

        let normal = IndicatorBundle {
            rsi: Some(55.0),
            ..IndicatorBundle::default()
        };
        assert!(TechnicalIndicatorsTool::render("AAPL", &normal).contains("(正常)"));
    }

    #[test]
    fn test_render_bearish_cross() {
        let bundle = IndicatorBundle {
            macd: Some(MacdTriple {
                macd: -0.5,
                signal: -0.2,
                histogram: -0.3,
            }),
            ..IndicatorBundle::default()
        };
        assert!(TechnicalIndicatorsTool::render("AAPL", &bundle).contains("死叉(看跌)"));
    }

    #[tokio::test]
    async fn test_execute_reports_indicators() {
        let tool = TechnicalIndicatorsTool::new(Arc::new(StubMarket::healthy()));

        let output = tool.execute(json!({"symbol": "aapl"})).await.unwrap();
        assert!(output.text.contains("AAPL 技术指标分析"));
        assert!(output.data["rsi"].is_number());
    }

    #[tokio::test]
    async fn test_execute_empty_bundle() {
        let tool = TechnicalIndicatorsTool::new(Arc::new(StubMarket::empty()));

        let output = tool.execute(json!({"symbol": "ZZZZ"})).await.unwrap();
        assert_eq!(output.text, "无法获取 ZZZZ 的技术指标数据");
    }

    #[test]
    fn test_metadata() {
        let tool = TechnicalIndicatorsTool::new(Arc::new(StubMarket::healthy()));
        assert_eq!(tool.name(), "calculate_indicators");
    }
}
