//! Tool trait definition

use advisor_core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output of one capability run
///
/// `text` is the rendered report the reasoning service (and the heuristic
/// parser) sees; `data` carries the same facts as structured fields so the
/// deterministic pipeline does not have to re-parse prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    pub data: Value,
}

impl ToolOutput {
    pub fn new(text: impl Into<String>, data: Value) -> Self {
        Self {
            text: text.into(),
            data,
        }
    }

    /// A text-only output with no structured payload
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: Value::Null,
        }
    }
}

/// Trait for capabilities the orchestrators can invoke
///
/// Each tool is independently callable and individually failure-tolerant:
/// an upstream data failure is rendered into the output text (and an
/// `{error: ...}` data payload), not raised. `Err` is reserved for inputs
/// that cannot be interpreted at all.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with the given parameters
    ///
    /// `params` is a JSON value matching [`Tool::input_schema`].
    async fn execute(&self, params: Value) -> Result<ToolOutput>;

    /// Unique tool name, matching the definition advertised to the service
    fn name(&self) -> &str;

    /// Description shown to the reasoning service
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input
    fn input_schema(&self) -> Value;
}
