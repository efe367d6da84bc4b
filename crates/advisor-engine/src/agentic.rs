//! Tool-calling reasoning loop strategy
//!
//! The reasoning service drives the run: each assistant turn either answers
//! in plain text (the final answer) or requests tool invocations, which are
//! executed and fed back as tool results. The loop is bounded; on exhaustion
//! the last assistant text stands as the answer rather than an error.

use crate::capabilities;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::parser::ResultParser;
use crate::prompts;
use crate::transcript::{OUTPUT_RETAINED_CHARS, RunRecord, TranscriptLog};
use advisor_core::{AnalysisResult, ChatReply, ConversationTurn, Portfolio, TraceStep, TurnRole};
use advisor_llm::{
    CompletionRequest, ContentBlock, LLMProvider, Message, MessageContent, Role, ToolDefinition,
};
use advisor_market::MarketData;
use advisor_tools::ToolRegistry;
use futures::future::join_all;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Prefix for tool outputs replayed as chat context
const TOOL_CONTEXT_PREFIX: &str = "[工具结果]";

/// Reply to a chat question plus the tool trace behind it
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub reply: ChatReply,
    pub steps: Vec<TraceStep>,
}

/// Completed reasoning loop run
struct LoopRun {
    /// Text of the last assistant turn
    final_answer: String,
    /// One step per executed tool invocation, in execution order
    steps: Vec<TraceStep>,
    /// Structured payload captured from the last news invocation
    news_data: Option<Value>,
    /// Conversation as sent, without the closing text turn
    transcript: Vec<Message>,
}

/// Artifacts of one tool invocation
struct Invocation {
    message: Message,
    step: TraceStep,
    news: Option<Value>,
}

/// Analysis strategy that lets the reasoning service steer tool use
pub struct AgenticAnalyzer {
    provider: Arc<dyn LLMProvider>,
    registry: Arc<ToolRegistry>,
    history: HistoryStore,
    config: EngineConfig,
    log: TranscriptLog,
}

impl AgenticAnalyzer {
    /// Create an analyzer over an existing tool registry
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        registry: Arc<ToolRegistry>,
        config: EngineConfig,
    ) -> Self {
        let log = TranscriptLog::new(config.logs_dir.clone());
        Self {
            provider,
            registry,
            history: HistoryStore::new(),
            config,
            log,
        }
    }

    /// Create an analyzer with the standard capabilities over a market
    /// data source
    pub fn with_market(
        provider: Arc<dyn LLMProvider>,
        market: Arc<dyn MarketData>,
        config: EngineConfig,
    ) -> Self {
        let registry = Arc::new(capabilities::build_registry(market));
        Self::new(provider, registry, config)
    }

    /// Run one full analysis for a symbol
    ///
    /// The run does not read conversation history; its transcript is
    /// appended to the symbol's history afterwards so follow-up chat can
    /// reuse the gathered data.
    #[instrument(skip(self, portfolio))]
    pub async fn analyze(
        &self,
        symbol: &str,
        analysis_type: &str,
        portfolio: Option<Portfolio>,
    ) -> Result<AnalysisResult> {
        let symbol = symbol.to_uppercase();
        info!(%symbol, analysis_type, "starting agentic analysis");

        let query = prompts::analysis_query(&symbol, portfolio.as_ref());
        let run = self.run_loop(vec![Message::user(&query)]).await?;

        let parsed = ResultParser::parse(&run.final_answer, &run.steps);
        let record = RunRecord::from_trace(&symbol, &run.final_answer, &run.steps, run.news_data);
        self.log.save(&record);

        let mut turns = transcript_turns(&run.transcript);
        turns.push(ConversationTurn::assistant(&run.final_answer));
        self.history.append(&symbol, turns).await;

        let detail = serde_json::to_value(&record)?;

        info!(
            %symbol,
            recommendation = %parsed.recommendation,
            confidence = parsed.confidence_score,
            steps = record.steps.len(),
            "agentic analysis complete"
        );

        Ok(AnalysisResult::new(
            &symbol,
            analysis_type,
            parsed.recommendation,
            parsed.confidence_score,
            run.final_answer,
        )
        .with_key_metrics(parsed.key_metrics)
        .with_detail(detail))
    }

    /// Answer a free-form question about a symbol
    ///
    /// The stored history for the symbol seeds the conversation; only the
    /// question and the final answer are appended back.
    #[instrument(skip(self, question, portfolio))]
    pub async fn chat(
        &self,
        symbol: &str,
        question: &str,
        portfolio: Option<Portfolio>,
    ) -> Result<ChatExchange> {
        let symbol = symbol.to_uppercase();
        info!(%symbol, "starting chat exchange");

        let query = prompts::chat_query(&symbol, question, portfolio.as_ref());
        let mut conversation = context_messages(&self.history.snapshot(&symbol).await);
        conversation.push(Message::user(&query));

        let run = self.run_loop(conversation).await?;

        self.history
            .append(
                &symbol,
                vec![
                    ConversationTurn::human(query),
                    ConversationTurn::assistant(&run.final_answer),
                ],
            )
            .await;

        info!(%symbol, steps = run.steps.len(), "chat exchange complete");

        Ok(ChatExchange {
            reply: ChatReply::new(run.final_answer),
            steps: run.steps,
        })
    }

    /// Drive the request/tool cycle until the service answers in plain
    /// text or the iteration budget runs out
    async fn run_loop(&self, mut conversation: Vec<Message>) -> Result<LoopRun> {
        let tools = self.tool_definitions();
        let mut steps: Vec<TraceStep> = Vec::new();
        let mut news_data: Option<Value> = None;
        let mut last_answer = String::new();

        for iteration in 1..=self.config.max_iterations {
            let request = CompletionRequest::builder()
                .model(&self.config.model)
                .messages(conversation.clone())
                .system(prompts::SYSTEM_PROMPT)
                .max_tokens(self.config.max_tokens)
                .temperature(f64::from(self.config.temperature))
                .tools(tools.clone())
                .build()?;

            let response = self.provider.complete(request).await?;
            debug!(
                iteration,
                stop_reason = ?response.stop_reason,
                tokens = response.usage.total(),
                "assistant turn received"
            );

            let message = response.message;
            if let Some(text) = message.text() {
                last_answer = text.to_string();
            }

            if !message.has_tool_uses() {
                info!(iteration, "reasoning loop complete");
                return Ok(LoopRun {
                    final_answer: last_answer,
                    steps,
                    news_data,
                    transcript: conversation,
                });
            }

            let calls: Vec<(String, String, Value)> = message
                .tool_uses()
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } => {
                        Some((id.clone(), name.clone(), input.clone()))
                    }
                    _ => None,
                })
                .collect();
            conversation.push(message);

            // Invocations run concurrently; results are appended in
            // request order so the transcript stays aligned.
            let invocations =
                join_all(calls.iter().map(|(id, name, input)| self.invoke(id, name, input))).await;

            for invocation in invocations {
                steps.push(invocation.step);
                if invocation.news.is_some() {
                    news_data = invocation.news;
                }
                conversation.push(invocation.message);
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "iteration budget exhausted, keeping last assistant answer"
        );
        Ok(LoopRun {
            final_answer: last_answer,
            steps,
            news_data,
            transcript: conversation,
        })
    }

    /// Execute one requested tool invocation
    ///
    /// Never fails the run: an unknown tool name and a failed execution
    /// both become tool results the service can react to.
    async fn invoke(&self, id: &str, name: &str, input: &Value) -> Invocation {
        let Some(tool) = self.registry.get(name) else {
            warn!(tool = name, "unknown tool requested");
            let text = format!("未知工具: {name}");
            return Invocation {
                message: Message::tool_result(id, &text),
                step: trace_step(name, input, text),
                news: None,
            };
        };

        debug!(tool = name, "executing tool");
        match tool.execute(input.clone()).await {
            Ok(output) => {
                let news = (name == "get_news")
                    .then(|| output.data.get("news_items").cloned())
                    .flatten()
                    .map(|items| json!({ "news_items": items }));

                Invocation {
                    step: trace_step(name, input, &output.text),
                    message: Message::tool_result(id, output.text),
                    news,
                }
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                let text = format!("工具调用失败: {e}");
                Invocation {
                    message: Message::tool_error(id, &text),
                    step: trace_step(name, input, text),
                    news: None,
                }
            }
        }
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry
            .list_tools()
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect()
    }
}

fn trace_step(tool: &str, input: &Value, output: impl Into<String>) -> TraceStep {
    let output: String = output.into();
    TraceStep {
        tool: tool.to_string(),
        input: input.clone(),
        output: output.chars().take(OUTPUT_RETAINED_CHARS).collect(),
    }
}

/// Flatten a loop transcript into storable turns
///
/// Tool results become tool turns; turns that render empty (tool-call-only
/// assistant messages) are dropped.
fn transcript_turns(messages: &[Message]) -> Vec<ConversationTurn> {
    messages
        .iter()
        .filter_map(|message| {
            let turn = match message.role {
                Role::User => match first_tool_result(message) {
                    Some(result) => ConversationTurn::tool(result),
                    None => ConversationTurn::human(message.text()?),
                },
                Role::Assistant => ConversationTurn::assistant(message.text()?),
                Role::System => return None,
            };
            (!turn.content.is_empty()).then_some(turn)
        })
        .collect()
}

/// Replay stored turns as request messages
///
/// Tool turns become labeled user-role context lines; a bare tool result
/// without its requesting turn would be rejected by the service.
fn context_messages(turns: &[ConversationTurn]) -> Vec<Message> {
    turns
        .iter()
        .map(|turn| match turn.role {
            TurnRole::Human => Message::user(&turn.content),
            TurnRole::Assistant => Message::assistant(&turn.content),
            TurnRole::Tool => Message::user(format!("{TOOL_CONTEXT_PREFIX} {}", turn.content)),
        })
        .collect()
}

fn first_tool_result(message: &Message) -> Option<&str> {
    match &message.content {
        Some(MessageContent::Blocks(blocks)) => blocks.iter().find_map(|block| match block {
            ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
            _ => None,
        }),
        _ => None,
    }
}
