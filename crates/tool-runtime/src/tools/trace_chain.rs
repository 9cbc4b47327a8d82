//! Knowledge-graph walk from a starting record.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::tool::{Tool, ToolContext, ToolDefinition, ToolError, ToolResult};
use crate::tools::require_str;

/// One-hop traversal: the node itself plus its directly connected concepts,
/// articles, and pulses.
const TRACE_STATEMENT: &str = "SELECT *, ->involves->concept AS related_concepts, ->mentions->article AS related_articles, ->mentions->pulse AS related_pulses FROM type::thing($start_node)";

/// Explore the knowledge graph starting from a specific record.
pub struct TraceNarrativeChainTool;

#[async_trait]
impl Tool for TraceNarrativeChainTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "trace_narrative_chain".to_string(),
            description: "Explore the knowledge graph starting from a specific node \
                          (e.g. 'company:catl') and surface its directly connected \
                          concepts, articles, and pulses."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "start_node": {
                        "type": "string",
                        "description": "The record id to start from (e.g. 'company:catl', 'concept:solid_state_battery')"
                    },
                    "depth": {
                        "type": "integer",
                        "default": 2,
                        "description": "Requested traversal depth. The current walk is a single hop; deeper traversal is a future extension."
                    }
                },
                "required": ["start_node"]
            }),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolResult, ToolError> {
        let start_node = require_str(&input, "start_node")?;
        // depth is accepted but the walk is fixed at one hop.
        let depth = input.get("depth").and_then(|v| v.as_u64()).unwrap_or(2);
        debug!(start_node, depth, "tracing narrative chain");

        let result = context
            .store
            .query(TRACE_STATEMENT, &[("start_node", json!(start_node))])
            .await?;

        let rendered = serde_json::to_string_pretty(result.rows(0))
            .map_err(|e| ToolError::ExecutionFailed(format!("JSON serialization failed: {e}")))?;
        Ok(ToolResult::ok(rendered))
    }
}
