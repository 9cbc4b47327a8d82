//! Error types for the MCP crate.

use crate::client::SessionState;
use crate::types::{error_codes, JsonRpcError};

/// Errors that can occur during MCP operations.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Failed to parse or serialize JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Transport I/O error.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The tool-server process could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// No matching response arrived within the per-call deadline. The id is
    /// abandoned; a late reply is discarded by later read loops.
    #[error("call '{method}' (id {id}) timed out")]
    Timeout { method: String, id: i64 },

    /// The stream closed before a response arrived.
    #[error("stream closed before a response to '{method}' (id {id})")]
    StreamClosed { method: String, id: i64 },

    /// The remote answered with a JSON-RPC error payload.
    #[error("remote error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The setup sequence did not complete; the session is unusable.
    #[error("handshake failed at {stage}: {detail}")]
    Handshake { stage: &'static str, detail: String },

    /// A tool call was attempted outside the `Ready` state.
    #[error("session not ready for tool calls (state: {state})")]
    NotReady { state: SessionState },

    /// The requested method is not supported.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid parameters for a method.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// The requested tool was not found in the registry.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}

impl From<JsonRpcError> for McpError {
    fn from(error: JsonRpcError) -> Self {
        McpError::Rpc {
            code: error.code,
            message: error.message,
        }
    }
}

impl McpError {
    /// Convert to a JSON-RPC error object.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        let code = match self {
            McpError::JsonParse(_) => error_codes::PARSE_ERROR,
            McpError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            McpError::InvalidParams(_) | McpError::ToolNotFound(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        };
        JsonRpcError {
            code,
            message: self.to_string(),
            data: None,
        }
    }
}
