//! Company fundamentals capability

use advisor_core::Result as CoreResult;
use advisor_llm::tools::schema;
use advisor_market::{CompanyOverview, MarketData, MarketError};
use advisor_tools::{Tool, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

const DESCRIPTION_CHARS: usize = 200;

/// Reports company profile and valuation fundamentals
pub struct CompanyInfoTool {
    market: Arc<dyn MarketData>,
}

#[derive(Debug, Deserialize)]
struct CompanyParams {
    symbol: String,
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}

impl CompanyInfoTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }

    fn render(symbol: &str, overview: &CompanyOverview) -> String {
        let description: String = overview
            .description
            .as_deref()
            .unwrap_or("N/A")
            .chars()
            .take(DESCRIPTION_CHARS)
            .collect();

        format!(
            "🏢 {} ({symbol})\n\n\
             基本信息:\n\
             - 行业: {}\n\
             - 板块: {}\n\
             - 国家: {}\n\
             - 交易所: {}\n\n\
             财务指标:\n\
             - 市值: ${}\n\
             - PE比率: {}\n\
             - PB比率: {}\n\
             - 股息率: {}\n\
             - EPS: ${}\n\
             - 52周最高: ${}\n\
             - 52周最低: ${}\n\n\
             公司简介:\n\
             {description}...",
            overview.name,
            or_na(overview.industry.as_deref()),
            or_na(overview.sector.as_deref()),
            or_na(overview.country.as_deref()),
            or_na(overview.exchange.as_deref()),
            or_na(overview.market_cap.as_deref()),
            or_na(overview.pe_ratio.as_deref()),
            or_na(overview.pb_ratio.as_deref()),
            or_na(overview.dividend_yield.as_deref()),
            or_na(overview.eps.as_deref()),
            or_na(overview.week_52_high.as_deref()),
            or_na(overview.week_52_low.as_deref()),
        )
    }
}

#[async_trait]
impl Tool for CompanyInfoTool {
    async fn execute(&self, params: Value) -> CoreResult<ToolOutput> {
        let params: CompanyParams = serde_json::from_value(params).map_err(|e| {
            advisor_core::Error::ProcessingFailed(format!("Invalid parameters: {e}"))
        })?;
        let symbol = params.symbol.to_uppercase();

        match self.market.company_overview(&symbol).await {
            Ok(overview) => {
                let text = Self::render(&symbol, &overview);
                let data = serde_json::to_value(&overview).unwrap_or(Value::Null);
                Ok(ToolOutput::new(text, data))
            }
            Err(MarketError::InvalidSymbol(_)) => Ok(ToolOutput::new(
                format!("未找到股票 {symbol} 的公司信息"),
                json!({"error": "no company data"}),
            )),
            Err(e) => Ok(ToolOutput::new(
                format!("错误: {e}"),
                json!({"error": e.to_string()}),
            )),
        }
    }

    fn name(&self) -> &str {
        "get_company_info"
    }

    fn description(&self) -> &str {
        "获取公司基本面信息，包含公司名称、行业、市值、PE比率等"
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

    fn sample_overview() -> CompanyOverview {
        CompanyOverview {
            symbol: "AAPL".to_string(),
            name: "Apple Inc".to_string(),
            description: Some("Apple Inc. designs and sells smartphones.".to_string()),
            exchange: Some("NASDAQ".to_string()),
            sector: Some("TECHNOLOGY".to_string()),
            industry: Some("ELECTRONIC COMPUTERS".to_string()),
            country: Some("USA".to_string()),
            market_cap: Some("2800000000000".to_string()),
            pe_ratio: Some("29.1".to_string()),
            pb_ratio: Some("35.2".to_string()),
            dividend_yield: Some("0.0055".to_string()),
            eps: Some("6.42".to_string()),
            week_52_high: Some("199.62".to_string()),
            week_52_low: Some("164.08".to_string()),
        }
    }

    #[test]
    fn test_render_full_overview() {
        let text = CompanyInfoTool::render("AAPL", &sample_overview());

        assert!(text.starts_with("🏢 Apple Inc (AAPL)"));
        assert!(text.contains("- 行业: ELECTRONIC COMPUTERS"));
        assert!(text.contains("- 板块: TECHNOLOGY"));
        assert!(text.contains("- 市值: $2800000000000"));
        assert!(text.contains("- PE比率: 29.1"));
        assert!(text.contains("- 52周最高: $199.62"));
        assert!(text.contains("公司简介:\nApple Inc. designs and sells smartphones...."));
    }

    #[test]
    fn test_render_missing_fields_default_to_na() {
        let overview = CompanyOverview {
            symbol: "AAPL".to_string(),
            name: "Apple Inc".to_string(),
            ..CompanyOverview::default()
        };

        let text = CompanyInfoTool::render("AAPL", &overview);
        assert!(text.contains("- 行业: N/A"));
        assert!(text.contains("- 市值: $N/A"));
        assert!(text.contains("公司简介:\nN/A..."));
    }

    #[tokio::test]
    async fn test_execute_reports_overview() {
        let tool = CompanyInfoTool::new(Arc::new(StubMarket::healthy()));

        let output = tool.execute(json!({"symbol": "aapl"})).await.unwrap();
        assert!(output.text.contains("(AAPL)"));
        assert!(output.data["Name"].is_string());
    }

    #[tokio::test]
    async fn test_execute_unknown_symbol() {
        let tool = CompanyInfoTool::new(Arc::new(StubMarket::empty()));

        let output = tool.execute(json!({"symbol": "ZZZZ"})).await.unwrap();
        assert_eq!(output.text, "未找到股票 ZZZZ 的公司信息");
    }

    #[test]
    fn test_metadata() {
        let tool = CompanyInfoTool::new(Arc::new(StubMarket::healthy()));
        assert_eq!(tool.name(), "get_company_info");
    }
}
