//! Tool definitions advertised to the reasoning service

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of one callable tool, as sent to the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name
    pub name: String,
    /// What the tool does, for the model's benefit
    pub description: String,
    /// JSON Schema describing the tool's input
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    ///
    /// # Example
    ///
    /// ```
    /// use advisor_llm::ToolDefinition;
    /// use advisor_llm::tools::schema;
    ///
    /// let definition = ToolDefinition::new(
    ///     "get_stock_price",
    ///     "Fetch the current quote for a ticker symbol",
    ///     schema::object(
    ///         serde_json::json!({
    ///             "symbol": schema::string("Ticker symbol, e.g. AAPL")
    ///         }),
    ///         vec!["symbol"],
    ///     ),
    /// );
    /// assert_eq!(definition.name, "get_stock_price");
    /// ```
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helpers for building JSON Schema fragments
pub mod schema {
    use serde_json::{Value, json};

    /// An object schema with the given properties and required keys
    pub fn object(properties: Value, required: Vec<&str>) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// A string property with a description
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// A number property with a description
    pub fn number(description: &str) -> Value {
        json!({
            "type": "number",
            "description": description,
        })
    }

    /// An integer property with a description
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }

    /// A boolean property with a description
    pub fn boolean(description: &str) -> Value {
        json!({
            "type": "boolean",
            "description": description,
        })
    }
}
