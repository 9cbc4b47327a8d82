//! Financial-claim verification against the report table.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::tool::{Tool, ToolContext, ToolDefinition, ToolError, ToolResult};
use crate::tools::require_str;

/// Resolve the company record id for a ticker, then pull its most recent
/// reports. The two statements execute in one batch; `$comp` is defined by
/// the first and consumed by the second.
const RESOLVE_COMPANY: &str =
    "LET $comp = (SELECT id FROM company WHERE ticker = $ticker LIMIT 1)[0]";
const SELECT_REPORTS: &str =
    "SELECT * FROM report WHERE company = $comp.id ORDER BY published_at DESC LIMIT 5";

/// Verify a financial claim against the report table.
pub struct VerifyFinancialsTool;

#[async_trait]
impl Tool for VerifyFinancialsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "verify_financials".to_string(),
            description: "Verify a financial claim against stored report data. \
                          Returns the most recent reports for a ticker."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "ticker": {
                        "type": "string",
                        "description": "Company ticker symbol (e.g. 'TSLA')"
                    },
                    "metric": {
                        "type": "string",
                        "description": "The metric to check (e.g. 'cash_equivalents', 'gross_margin')"
                    }
                },
                "required": ["ticker", "metric"]
            }),
        }
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolResult, ToolError> {
        let ticker = require_str(&input, "ticker")?;
        let metric = require_str(&input, "metric")?;
        debug!(ticker, metric, "verifying financials");

        let result = context
            .store
            .query_batch(
                &[RESOLVE_COMPANY, SELECT_REPORTS],
                &[("ticker", json!(ticker))],
            )
            .await?;

        // An unknown ticker legitimately yields zero reports.
        let reports = result.rows(1);
        if reports.is_empty() {
            return Ok(ToolResult::ok(format!(
                "No reports found for ticker {ticker}. Hunter directive might differ."
            )));
        }

        let rendered = serde_json::to_string_pretty(reports)
            .map_err(|e| ToolError::ExecutionFailed(format!("JSON serialization failed: {e}")))?;
        Ok(ToolResult::ok(format!(
            "Latest reports for {ticker} (metric: {metric}):\n{rendered}"
        )))
    }
}
