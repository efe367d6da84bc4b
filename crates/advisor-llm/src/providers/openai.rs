//! OpenAI-compatible chat-completions provider
//!
//! Talks to any endpoint implementing the OpenAI `/chat/completions` wire
//! protocol (OpenAI itself, or a local inference server). Converts between
//! the transcript model of this crate and the OpenAI message layout, which
//! differs in two ways: tool results are standalone `role: "tool"` messages
//! rather than content blocks, and tool-call arguments travel as JSON
//! encoded in a string.

use crate::completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
use crate::error::{LLMError, Result};
use crate::messages::{ContentBlock, Message, MessageContent, Role};
use crate::provider::LLMProvider;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Base URL of the API, without the `/chat/completions` suffix
    pub api_base: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a configuration with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read configuration from `OPENAI_API_KEY` and optional `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            LLMError::ConfigurationError("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let mut config = Self::new(api_key);
        if let Ok(api_base) = std::env::var("OPENAI_API_BASE") {
            config.api_base = api_base;
        }
        Ok(config)
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider from a configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider with default configuration for the given key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Access the active configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Flatten the transcript into OpenAI wire messages
    ///
    /// The optional system prompt leads the array. Each transcript message
    /// expands to one or more wire messages because tool-result blocks
    /// become standalone `role: "tool"` entries.
    fn build_wire_messages(request: &CompletionRequest) -> Vec<Value> {
        let mut wire = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            wire.push(json!({ "role": "system", "content": system }));
        }

        for message in &request.messages {
            wire.extend(Self::convert_message(message));
        }

        wire
    }

    fn role_str(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Convert one transcript message into its wire representation(s)
    fn convert_message(message: &Message) -> Vec<Value> {
        let role = Self::role_str(message.role);

        match &message.content {
            None => vec![json!({ "role": role, "content": "" })],
            Some(MessageContent::Text(text)) => {
                vec![json!({ "role": role, "content": text })]
            }
            Some(MessageContent::Blocks(blocks)) => Self::convert_blocks(role, blocks),
        }
    }

    fn convert_blocks(role: &str, blocks: &[ContentBlock]) -> Vec<Value> {
        let mut wire = Vec::new();
        let mut text_parts: Vec<&str> = Vec::new();
        let mut tool_calls: Vec<Value> = Vec::new();

        for block in blocks {
            match block {
                ContentBlock::Text { text } => text_parts.push(text),
                ContentBlock::ToolUse { id, name, input } => {
                    // Arguments travel as JSON encoded in a string
                    tool_calls.push(json!({
                        "id": id,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": input.to_string(),
                        }
                    }));
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => {
                    wire.push(json!({
                        "role": "tool",
                        "tool_call_id": tool_use_id,
                        "content": content,
                    }));
                }
            }
        }

        if !tool_calls.is_empty() {
            let content = if text_parts.is_empty() {
                Value::Null
            } else {
                Value::String(text_parts.join("\n"))
            };
            wire.push(json!({
                "role": role,
                "content": content,
                "tool_calls": tool_calls,
            }));
        } else if !text_parts.is_empty() {
            wire.push(json!({ "role": role, "content": text_parts.join("\n") }));
        }

        wire
    }

    /// Convert tool definitions to the OpenAI function-tool layout
    fn convert_tools(tools: &[ToolDefinition]) -> Vec<Value> {
        tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    }
                })
            })
            .collect()
    }

    /// Map the wire response back into the transcript model
    fn parse_response(response: WireResponse) -> Result<CompletionResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("response carried no choices".to_string()))?;

        let mut blocks = Vec::new();

        if let Some(content) = choice.message.content {
            if !content.is_empty() {
                blocks.push(ContentBlock::Text { text: content });
            }
        }

        for call in choice.message.tool_calls.unwrap_or_default() {
            let input: Value =
                serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null);
            blocks.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.function.name,
                input,
            });
        }

        // An assistant turn may legitimately be empty (e.g. forced stop)
        if blocks.is_empty() {
            blocks.push(ContentBlock::Text {
                text: String::new(),
            });
        }

        let stop_reason = Self::map_finish_reason(choice.finish_reason.as_deref());

        let usage = response.usage.map_or_else(TokenUsage::default, |usage| TokenUsage {
            input_tokens: usage.prompt_tokens.unwrap_or(0),
            output_tokens: usage.completion_tokens.unwrap_or(0),
        });

        Ok(CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: Some(MessageContent::Blocks(blocks)),
            },
            stop_reason,
            usage,
        })
    }

    fn map_finish_reason(finish_reason: Option<&str>) -> StopReason {
        match finish_reason {
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            Some("stop") | None => StopReason::EndTurn,
            Some(other) => {
                debug!(finish_reason = other, "unrecognized finish_reason");
                StopReason::EndTurn
            }
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut body = json!({
            "model": request.model,
            "messages": Self::build_wire_messages(&request),
            "max_tokens": request.max_tokens,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(tools) = &request.tools {
            if !tools.is_empty() {
                body["tools"] = json!(Self::convert_tools(tools));
            }
        }

        let url = format!("{}/chat/completions", self.config.api_base);
        debug!(url = %url, message_count = request.messages.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(text),
                400 => LLMError::InvalidRequest(text),
                404 => LLMError::ModelNotFound(request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {text}")),
            });
        }

        let wire: WireResponse = response.json().await?;
        Self::parse_response(wire)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest::builder()
            .model("gpt-4-turbo-preview")
            .messages(messages)
            .build()
            .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = OpenAIConfig::new("key");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_overrides() {
        let config = OpenAIConfig::new("key")
            .with_api_base("http://localhost:1234/v1")
            .with_timeout(30);
        assert_eq!(config.api_base, "http://localhost:1234/v1");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_from_env() {
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "env-key");
            std::env::set_var("OPENAI_API_BASE", "http://localhost:9999/v1");
        }
        let config = OpenAIConfig::from_env().unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.api_base, "http://localhost:9999/v1");
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("OPENAI_API_BASE");
        }
    }

    #[test]
    fn test_system_prompt_leads_wire_messages() {
        let request = CompletionRequest::builder()
            .model("m")
            .system("be terse")
            .add_message(Message::user("hi"))
            .build()
            .unwrap();

        let wire = OpenAIProvider::build_wire_messages(&request);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[0]["content"], "be terse");
        assert_eq!(wire[1]["role"], "user");
    }

    #[test]
    fn test_assistant_tool_call_conversion() {
        let message = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "get_stock_price".to_string(),
                input: json!({"symbol": "AAPL"}),
            }])),
        };

        let wire = OpenAIProvider::convert_message(&message);
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0]["role"], "assistant");
        assert!(wire[0]["content"].is_null());

        let calls = wire[0]["tool_calls"].as_array().unwrap();
        assert_eq!(calls[0]["id"], "call_1");
        assert_eq!(calls[0]["function"]["name"], "get_stock_price");
        // Arguments must be string-encoded JSON on the wire
        let arguments = calls[0]["function"]["arguments"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(arguments).unwrap(),
            json!({"symbol": "AAPL"})
        );
    }

    #[test]
    fn test_tool_results_become_tool_role_messages() {
        let message = Message {
            role: Role::User,
            content: Some(MessageContent::Blocks(vec![
                ContentBlock::ToolResult {
                    tool_use_id: "call_1".to_string(),
                    content: "price: 100".to_string(),
                    is_error: None,
                },
                ContentBlock::ToolResult {
                    tool_use_id: "call_2".to_string(),
                    content: "no news".to_string(),
                    is_error: Some(true),
                },
            ])),
        };

        let wire = OpenAIProvider::convert_message(&message);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["role"], "tool");
        assert_eq!(wire[0]["tool_call_id"], "call_1");
        assert_eq!(wire[1]["tool_call_id"], "call_2");
    }

    #[test]
    fn test_tools_conversion() {
        let tools = vec![ToolDefinition::new(
            "calculate_indicators",
            "RSI, MACD, SMA",
            json!({"type": "object", "properties": {}}),
        )];

        let wire = OpenAIProvider::convert_tools(&tools);
        assert_eq!(wire[0]["type"], "function");
        assert_eq!(wire[0]["function"]["name"], "calculate_indicators");
        assert_eq!(wire[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(
            OpenAIProvider::map_finish_reason(Some("tool_calls")),
            StopReason::ToolUse
        );
        assert_eq!(
            OpenAIProvider::map_finish_reason(Some("length")),
            StopReason::MaxTokens
        );
        assert_eq!(
            OpenAIProvider::map_finish_reason(Some("stop")),
            StopReason::EndTurn
        );
        assert_eq!(
            OpenAIProvider::map_finish_reason(Some("content_filter")),
            StopReason::EndTurn
        );
        assert_eq!(OpenAIProvider::map_finish_reason(None), StopReason::EndTurn);
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let wire: WireResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {
                            "name": "get_news",
                            "arguments": "{\"symbol\": \"TSLA\", \"limit\": 5}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 50, "completion_tokens": 12}
        }))
        .unwrap();

        let response = OpenAIProvider::parse_response(wire).unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.usage.total(), 62);

        let uses = response.message.tool_uses();
        assert_eq!(uses.len(), 1);
        match uses[0] {
            ContentBlock::ToolUse { name, input, .. } => {
                assert_eq!(name, "get_news");
                assert_eq!(input["limit"], 5);
            }
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_plain_text() {
        let wire: WireResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {"content": "建议买入，置信度：75%"},
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        let response = OpenAIProvider::parse_response(wire).unwrap();
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.message.text(), Some("建议买入，置信度：75%"));
        assert!(!response.message.has_tool_uses());
        assert_eq!(response.usage.total(), 0);
    }

    #[test]
    fn test_parse_response_empty_message() {
        let wire: WireResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {"content": ""},
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        let response = OpenAIProvider::parse_response(wire).unwrap();
        assert_eq!(response.message.text(), Some(""));
    }

    #[test]
    fn test_parse_response_no_choices() {
        let wire: WireResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(OpenAIProvider::parse_response(wire).is_err());
    }

    #[test]
    fn test_malformed_arguments_fall_back_to_null() {
        let wire: WireResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_news", "arguments": "not json"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let response = OpenAIProvider::parse_response(wire).unwrap();
        match response.message.tool_uses()[0] {
            ContentBlock::ToolUse { input, .. } => assert!(input.is_null()),
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_provider_name() {
        let provider = OpenAIProvider::new("key").unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[tokio::test]
    #[ignore] // Requires a live endpoint and OPENAI_API_KEY
    async fn test_complete_live() {
        let provider = OpenAIProvider::from_env().unwrap();
        let request = request_with(vec![Message::user("Say OK")]);
        let response = provider.complete(request).await.unwrap();
        assert!(response.message.text().is_some());
    }
}
