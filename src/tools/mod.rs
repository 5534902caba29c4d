//! Tool System - Exposes adapter operations as named, schema-described callables
//!
//! Information Hiding:
//! - Tool execution details hidden behind trait
//! - Tool parameters and schemas hidden in implementations
//! - Registry implementation details hidden from consumers
//! - Errors turned into `Error: ...` text at the registry boundary

pub mod calendar;
pub mod contacts;
pub mod macros;
pub mod notes;
pub mod registry;

use crate::adapters::time::MAX_LOOKAHEAD_DAYS;
use crate::osa::Outcome;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

pub use registry::ToolRegistry;

/// Tool parameter schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: String,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Tool metadata - describes what the tool does and how to use it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    /// JSON Schema object describing the arguments
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut schema = json!({
                "type": param.param_type,
                "description": param.description,
            });
            if let (Some(default), Some(obj)) = (&param.default, schema.as_object_mut()) {
                obj.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), schema);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl fmt::Display for ToolMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// The single text block handed back to the caller
    pub fn text(&self) -> String {
        if self.success {
            self.output.clone()
        } else {
            format!("Error: {}", self.error.as_deref().unwrap_or("unknown error"))
        }
    }
}

/// Tool trait - All tools must implement this
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool metadata (name, description, parameters)
    fn metadata(&self) -> ToolMetadata;

    /// Execute the tool with given arguments
    async fn execute(&self, args: Value) -> Result<ToolResult>;

    /// Validate arguments before execution (optional)
    fn validate(&self, _args: &Value) -> Result<()> {
        Ok(())
    }
}

/// Render a found value as pretty JSON after a short heading
pub(crate) fn render_outcome<T: Serialize>(
    outcome: Outcome<T>,
    heading: impl FnOnce(&T) -> String,
    not_found: impl FnOnce() -> String,
) -> Result<ToolResult> {
    match outcome {
        Outcome::Found(value) => {
            let body = serde_json::to_string_pretty(&value)?;
            Ok(ToolResult::success(format!("{}\n{}", heading(&value), body)))
        }
        Outcome::NotFound => Ok(ToolResult::success(not_found())),
    }
}

/// Lookahead in days from an optional numeric argument
pub(crate) fn days_arg(args: &Value, default: u32) -> Result<u32> {
    match crate::validate_optional_number!(args, "days") {
        Some(days) if (0..=i64::from(MAX_LOOKAHEAD_DAYS)).contains(&days) => Ok(days as u32),
        Some(days) => Err(anyhow::anyhow!(
            "'days' must be between 0 and {}, got {}",
            MAX_LOOKAHEAD_DAYS,
            days
        )),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_schema() {
        let metadata = crate::tool_metadata! {
            name: "calendar_list_events",
            description: "List events",
            parameters: [
                {
                    name: "days",
                    type: "integer",
                    description: "Lookahead in days",
                    required: false,
                    default: 7
                },
                {
                    name: "calendar",
                    type: "string",
                    description: "Calendar name",
                    required: false
                }
            ]
        };

        let schema = metadata.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["days"]["type"], "integer");
        assert_eq!(schema["properties"]["days"]["default"], 7);
        assert!(schema["properties"]["calendar"].get("default").is_none());
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn test_failure_text_is_prefixed() {
        assert_eq!(ToolResult::failure("boom").text(), "Error: boom");
        assert_eq!(ToolResult::success("ok").text(), "ok");
    }

    #[test]
    fn test_days_arg() {
        assert_eq!(days_arg(&json!({}), 7).unwrap(), 7);
        assert_eq!(days_arg(&json!({"days": 30}), 7).unwrap(), 30);
        assert_eq!(days_arg(&json!({"days": 14.0}), 7).unwrap(), 14);
        assert!(days_arg(&json!({"days": 1.5}), 7).is_err());
        assert!(days_arg(&json!({"days": 3651}), 7).is_err());
        assert!(days_arg(&json!({"days": -1}), 7).is_err());
        assert!(days_arg(&json!({"days": "soon"}), 7).is_err());
    }
}
