//! Prompt construction for analysis and chat runs
//!
//! The prompts are Chinese-first because the capability reports and the
//! result parser share that contract; the reasoning service is instructed
//! to answer with an explicit 买入/持有/卖出 recommendation and a
//! `置信度: X%` line the parser can recover.

use advisor_core::Portfolio;

/// System prompt for the tool-calling analyst
pub const SYSTEM_PROMPT: &str = "你是一位专业的股票分析师，擅长综合分析股票的消息面、技术面和基本面。

你的任务是：
1. 使用提供的工具获取股票的各类数据
2. 从消息面、技术面、基本面三个维度进行分析
3. 给出明确的投资建议：买入/持有/卖出
4. 提供详细的分析理由和风险提示

工具使用策略：
- get_stock_price: 获取实时价格和基本行情
- get_news: 分析最近新闻和市场情感
- calculate_indicators: 计算技术指标（RSI、MACD等）
- get_company_info: 获取公司基本面信息

分析框架：
1. 消息面：新闻情感、重大事件、市场热度
2. 技术面：价格趋势、技术指标、支撑压力位
3. 基本面：公司质量、估值水平、财务健康度
4. 综合决策：基于以上三个维度给出建议

**重要：你的最终回答必须包含以下结构化信息**：
- 明确的建议：买入/持有/卖出
- 置信度：X% (0-100之间的数字)
- 详细的分析理由

请用中文回答，分析要专业且易懂。";

/// Build the analysis query for the agentic strategy
pub fn analysis_query(symbol: &str, portfolio: Option<&Portfolio>) -> String {
    let symbol = symbol.to_uppercase();
    let mut query = format!(
        "请全面分析股票 {symbol}，包括：
1. 消息面分析（最近新闻和市场情感）
2. 技术面分析（价格趋势和技术指标）
3. 基本面分析（公司质量和估值）
4. 最终给出买入/持有/卖出的明确建议，并说明理由和置信度"
    );

    if let Some(portfolio) = portfolio {
        if let Some(position) = portfolio.position_for(&symbol) {
            query.push_str(&format!(
                "\n\n**用户持仓信息**：
- 持有 {symbol} 股票：{} 股
- 平均成本：${:.2}
- 投资组合总价值：${:.2}

请在分析时考虑用户的持仓情况，给出是否应该加仓、减仓或持有的建议。",
                position.shares, position.avg_cost, portfolio.total_value
            ));
        }
    }

    query
}

/// Build the chat query wrapping a free-form question
pub fn chat_query(symbol: &str, question: &str, portfolio: Option<&Portfolio>) -> String {
    let symbol = symbol.to_uppercase();
    let mut query =
        format!("请基于{symbol}的消息面、技术面和基本面，回答：{question}。需要时可调用工具获取数据。");

    if let Some(position) = portfolio.and_then(|p| p.position_for(&symbol)) {
        query.push_str(&format!(
            " 用户持仓：{}股，成本价${}。",
            position.shares, position.avg_cost
        ));
    }

    query
}

/// Build the informational seed message for the pipeline strategy
pub fn pipeline_seed(symbol: &str, portfolio: Option<&Portfolio>) -> String {
    let symbol = symbol.to_uppercase();
    let mut prompt =
        format!("请全面分析股票 {symbol}：消息面、技术面与基本面，并给出买入/持有/卖出建议及置信度。");

    if let Some(position) = portfolio.and_then(|p| p.position_for(&symbol)) {
        prompt.push_str(&format!(
            " 用户持仓：{}股，成本价${}；请结合持仓给出加仓/减仓/持有建议。",
            position.shares, position.avg_cost
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::Position;
    use std::collections::HashMap;

    fn portfolio_with_position(symbol: &str) -> Portfolio {
        let mut positions = HashMap::new();
        positions.insert(
            symbol.to_string(),
            Position {
                shares: 10.0,
                avg_cost: 80.0,
            },
        );
        Portfolio {
            total_value: 10000.0,
            positions,
        }
    }

    #[test]
    fn test_system_prompt_names_all_tools() {
        for tool in [
            "get_stock_price",
            "get_news",
            "calculate_indicators",
            "get_company_info",
        ] {
            assert!(SYSTEM_PROMPT.contains(tool));
        }
        assert!(SYSTEM_PROMPT.contains("置信度"));
    }

    #[test]
    fn test_analysis_query_without_portfolio() {
        let query = analysis_query("aapl", None);
        assert!(query.contains("请全面分析股票 AAPL"));
        assert!(query.contains("买入/持有/卖出"));
        assert!(!query.contains("用户持仓信息"));
    }

    #[test]
    fn test_analysis_query_with_position() {
        let portfolio = portfolio_with_position("AAPL");
        let query = analysis_query("AAPL", Some(&portfolio));
        assert!(query.contains("**用户持仓信息**"));
        assert!(query.contains("持有 AAPL 股票：10 股"));
        assert!(query.contains("平均成本：$80.00"));
        assert!(query.contains("投资组合总价值：$10000.00"));
    }

    #[test]
    fn test_analysis_query_ignores_position_for_other_symbol() {
        let portfolio = portfolio_with_position("TSLA");
        let query = analysis_query("AAPL", Some(&portfolio));
        assert!(!query.contains("用户持仓信息"));
    }

    #[test]
    fn test_chat_query_embeds_question() {
        let query = chat_query("AAPL", "现在适合加仓吗？", None);
        assert!(query.contains("回答：现在适合加仓吗？"));
        assert!(query.starts_with("请基于AAPL"));
    }

    #[test]
    fn test_chat_query_with_position() {
        let portfolio = portfolio_with_position("AAPL");
        let query = chat_query("AAPL", "风险如何？", Some(&portfolio));
        assert!(query.contains("用户持仓：10股，成本价$80。"));
    }

    #[test]
    fn test_pipeline_seed_with_position() {
        let portfolio = portfolio_with_position("MSFT");
        let prompt = pipeline_seed("msft", Some(&portfolio));
        assert!(prompt.contains("请全面分析股票 MSFT"));
        assert!(prompt.contains("加仓/减仓/持有"));
    }
}
