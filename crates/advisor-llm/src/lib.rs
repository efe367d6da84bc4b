//! Reasoning-service client for advisor-rs
//!
//! Provider-agnostic types for talking to a chat-completion service with
//! tool calling:
//!
//! - Message/transcript types ([`Message`], [`ContentBlock`])
//! - Completion request/response types with a builder
//! - Tool definitions and JSON-schema helpers for function calling
//! - The [`LLMProvider`] trait plus an OpenAI-compatible implementation
//!   (behind the `openai` feature, enabled by default)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
