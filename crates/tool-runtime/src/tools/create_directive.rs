//! Directive creation.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use abyss_core::Directive;

use crate::tool::{Tool, ToolContext, ToolDefinition, ToolError, ToolResult};
use crate::tools::require_str;

/// Status and creation timestamp are assigned by the store, not the caller.
const CREATE_STATEMENT: &str = "CREATE directive CONTENT { target: $target, type: $type, status: 'active', context: $context, created_at: time::now() }";

/// Create a long-term surveillance directive for the hunter mechanism.
pub struct CreateDirectiveTool;

#[async_trait]
impl Tool for CreateDirectiveTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_directive".to_string(),
            description: "Create a long-term surveillance directive for the hunter \
                          mechanism. Useful for tracking entities over time."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "target": {
                        "type": "string",
                        "description": "The target entity (e.g. 'Elon Musk', '$TSLA')"
                    },
                    "type": {
                        "type": "string",
                        "description": "Type of task ('track_replies', 'monitor_sentiment', 'fetch_10k')"
                    },
                    "context": {
                        "type": ["object", "string"],
                        "description": "Extra task parameters as a JSON object, or a JSON-encoded string"
                    }
                },
                "required": ["target", "type"]
            }),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolResult, ToolError> {
        let target = require_str(&input, "target")?;
        let kind = require_str(&input, "type")?;
        let directive_context = parse_context(input.get("context"));
        debug!(target, kind, "creating directive");

        let result = context
            .store
            .query(
                CREATE_STATEMENT,
                &[
                    ("target", json!(target)),
                    ("type", json!(kind)),
                    ("context", directive_context),
                ],
            )
            .await?;

        let row = result.rows(0).first().cloned().ok_or_else(|| {
            ToolError::ExecutionFailed("store returned no record for the created directive".into())
        })?;
        let directive: Directive = serde_json::from_value(row).map_err(|e| {
            ToolError::ExecutionFailed(format!("store returned a malformed directive record: {e}"))
        })?;

        let rendered = serde_json::to_string_pretty(&directive)
            .map_err(|e| ToolError::ExecutionFailed(format!("JSON serialization failed: {e}")))?;
        Ok(ToolResult::ok(format!(
            "Directive created successfully: {rendered}"
        )))
    }
}

/// Interpret the caller's context payload.
///
/// Objects pass through; strings are parsed as JSON and wrapped as
/// `{"raw": <string>}` when they don't parse; an absent context becomes an
/// empty object.
fn parse_context(raw: Option<&Value>) -> Value {
    match raw {
        None => json!({}),
        Some(Value::String(s)) => {
            serde_json::from_str(s).unwrap_or_else(|_| json!({ "raw": s }))
        }
        Some(value) => value.clone(),
    }
}
