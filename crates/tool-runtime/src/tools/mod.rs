//! Intelligence tool implementations.

mod create_directive;
mod trace_chain;
mod verify_financials;

pub use create_directive::CreateDirectiveTool;
pub use trace_chain::TraceNarrativeChainTool;
pub use verify_financials::VerifyFinancialsTool;

use serde_json::Value;

use crate::registry::{RegistryError, ToolRegistry};
use crate::tool::ToolError;

/// Build the registry served by the abyss-intelligence endpoint.
pub fn intelligence_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(TraceNarrativeChainTool)?;
    registry.register(CreateDirectiveTool)?;
    registry.register(VerifyFinancialsTool)?;
    Ok(registry)
}

pub(crate) fn require_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    input
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidInput(format!("missing '{field}' field")))
}
