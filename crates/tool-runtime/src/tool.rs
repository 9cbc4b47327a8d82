use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use abyss_store::{StoreError, SurrealClient};

/// Describes a tool's interface for remote consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name (e.g. "trace_narrative_chain")
    pub name: String,
    /// Human-readable description for the caller
    pub description: String,
    /// JSON Schema describing the expected input
    pub input_schema: Value,
}

/// Result of executing a tool, rendered back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Human-readable result content
    pub content: String,
    /// Whether this result represents an error
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }
}

/// Context passed to tool execution.
///
/// Carries the store session handle explicitly: each invocation works
/// against the session it is handed, and a failed session is replaced by
/// its owner rather than healed behind the tools' backs.
#[derive(Clone)]
pub struct ToolContext {
    /// Shared handle to the backing store session.
    pub store: Arc<SurrealClient>,
}

impl ToolContext {
    pub fn new(store: Arc<SurrealClient>) -> Self {
        Self { store }
    }
}

/// The primary extension point: all tools implement this trait.
///
/// Tools are object-safe, Send + Sync, and async.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's definition (name, description, JSON Schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON input.
    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolResult, ToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl fmt::Display for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.description)
    }
}

/// Simple echo tool for testing purposes.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".to_string(),
            description: "Echoes back the input message. For testing.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The message to echo back"
                    }
                },
                "required": ["message"]
            }),
        }
    }

    async fn execute(&self, input: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
        let message = input
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput("missing 'message' field".to_string()))?;

        Ok(ToolResult::ok(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abyss_core::SurrealConfig;

    fn test_context() -> ToolContext {
        ToolContext::new(Arc::new(SurrealClient::new(SurrealConfig::from_env())))
    }

    #[test]
    fn tool_definition_serialization() {
        let def = ToolDefinition {
            name: "test_tool".to_string(),
            description: "A test tool".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
        };
        let json = serde_json::to_string(&def).unwrap();
        let roundtrip: ToolDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.name, "test_tool");
    }

    #[test]
    fn store_error_detail_survives_display() {
        let err = ToolError::from(StoreError::Statement {
            index: 1,
            detail: "table report missing".to_string(),
        });
        assert!(err.to_string().contains("statement 1"));
        assert!(err.to_string().contains("table report missing"));
    }

    #[tokio::test]
    async fn echo_tool() {
        let tool = EchoTool;
        assert_eq!(tool.definition().name, "echo");

        let result = tool
            .execute(
                serde_json::json!({"message": "hello world"}),
                &test_context(),
            )
            .await
            .unwrap();
        assert_eq!(result.content, "hello world");
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn echo_tool_rejects_missing_message() {
        let err = EchoTool
            .execute(serde_json::json!({}), &test_context())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
