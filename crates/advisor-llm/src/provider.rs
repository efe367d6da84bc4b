//! Reasoning-service provider trait

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait implemented by reasoning-service clients
///
/// The orchestrators depend only on this trait; the concrete transport
/// (OpenAI-compatible HTTP, a local inference server, a test stub) is
/// injected behind it.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate one assistant turn for the given transcript
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name, for logging
    fn name(&self) -> &str;
}
