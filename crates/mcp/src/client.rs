//! MCP client: request correlation and the session handshake.
//!
//! A client owns its transport and drives exactly one call at a time: the
//! remote's stdout is a single ordered stream, so read phases serialize on
//! `&mut self` rather than demultiplexing into per-call queues. Responses
//! for abandoned (timed-out) ids and interleaved non-protocol lines are
//! discarded by the read loop.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::catalog::ToolCatalog;
use crate::error::McpError;
use crate::transport::{McpTransport, ProcessTransport};
use crate::types::*;

/// Deadline for each handshake call.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default deadline for tool invocations.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Lifecycle of a session.
///
/// `Ready` is the only state permitting tool calls. `Failed` is terminal:
/// the session is torn down and a fresh one started to retry; the state
/// machine does not self-heal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Negotiating,
    Notified,
    Ready,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unstarted => "unstarted",
            SessionState::Negotiating => "negotiating",
            SessionState::Notified => "notified",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// An MCP client session over a transport.
pub struct McpClient<T: McpTransport> {
    transport: T,
    next_id: i64,
    state: SessionState,
    catalog: ToolCatalog,
    client_name: String,
    call_timeout: Duration,
}

impl McpClient<ProcessTransport> {
    /// Spawn a tool-server process and run the full handshake.
    pub async fn spawn(
        program: &str,
        args: &[String],
        env_overrides: &HashMap<String, String>,
    ) -> Result<Self, McpError> {
        let transport = ProcessTransport::spawn(program, args, env_overrides)?;
        let mut client = Self::new(transport);
        client.handshake().await?;
        Ok(client)
    }

    /// Tear the session down, killing the server process.
    ///
    /// Safe to call whatever state the session is in, including after the
    /// process already exited.
    pub async fn shutdown(mut self) {
        self.transport.terminate().await;
    }
}

impl<T: McpTransport> McpClient<T> {
    /// Wrap a transport in an unstarted session. Call [`handshake`] before
    /// invoking tools.
    ///
    /// [`handshake`]: McpClient::handshake
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: 1,
            state: SessionState::Unstarted,
            catalog: ToolCatalog::default(),
            client_name: "abyss-harness".to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Tools discovered during the handshake. Empty before `Ready`.
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Issue a request and wait for its response.
    ///
    /// Assigns the next unused id, writes the frame, then reads lines until
    /// one decodes as a response with the matching id. Lines that fail to
    /// decode (interleaved diagnostics) or carry a different id (late
    /// replies to abandoned calls) are discarded. EOF and deadline expiry
    /// are distinct outcomes from an error response.
    pub async fn call(
        &mut self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(RpcId::Number(id), method, params);
        let frame = serde_json::to_string(&request)?;
        tracing::debug!(method = %method, id, "sending request");
        self.transport.send(&frame).await?;

        let deadline = Instant::now() + timeout;
        loop {
            let line = match tokio::time::timeout_at(deadline, self.transport.receive()).await {
                Err(_) => {
                    tracing::warn!(method = %method, id, "call timed out");
                    return Err(McpError::Timeout {
                        method: method.to_string(),
                        id,
                    });
                }
                Ok(Err(e)) => return Err(e),
                Ok(Ok(None)) => {
                    return Err(McpError::StreamClosed {
                        method: method.to_string(),
                        id,
                    })
                }
                Ok(Ok(Some(line))) => line,
            };

            match Message::decode(&line) {
                Ok(Message::Response(response)) if response.id == RpcId::Number(id) => {
                    return Ok(response)
                }
                Ok(Message::Response(response)) => {
                    tracing::trace!(id = ?response.id, "discarding response with no pending call");
                }
                Ok(_) => {
                    tracing::trace!("discarding non-response message");
                }
                Err(_) => {
                    tracing::trace!(line = %line, "discarding non-protocol line");
                }
            }
        }
    }

    /// Write a notification. Fire-and-forget: nothing is read back.
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let notification = JsonRpcNotification::new(method, params);
        let frame = serde_json::to_string(&notification)?;
        tracing::debug!(method = %method, "sending notification");
        self.transport.send(&frame).await
    }

    /// Drive the fixed setup sequence: capability negotiation, readiness
    /// notification, catalog discovery.
    ///
    /// Any failure leaves the session in the terminal `Failed` state.
    pub async fn handshake(&mut self) -> Result<(), McpError> {
        if self.state != SessionState::Unstarted {
            return Err(McpError::Handshake {
                stage: "initialize",
                detail: format!("handshake already attempted (state: {})", self.state),
            });
        }

        self.state = SessionState::Negotiating;
        let params = serde_json::to_value(InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: self.client_name.clone(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
        })?;
        let negotiated = self
            .call("initialize", Some(params), HANDSHAKE_TIMEOUT)
            .await
            .and_then(|response| response.outcome().map_err(McpError::from));
        self.check_stage("initialize", negotiated)?;

        let notified = self.notify("notifications/initialized", None).await;
        self.check_stage("initialized", notified)?;
        self.state = SessionState::Notified;

        let listed = self
            .call("tools/list", None, HANDSHAKE_TIMEOUT)
            .await
            .and_then(|response| response.outcome().map_err(McpError::from))
            .and_then(|result| {
                serde_json::from_value::<ListToolsResult>(result).map_err(McpError::from)
            });
        let listed = self.check_stage("tools/list", listed)?;

        self.catalog = ToolCatalog::new(listed.tools);
        self.state = SessionState::Ready;
        tracing::info!(tools = self.catalog.len(), "session ready");
        Ok(())
    }

    /// Invoke a tool by exact name.
    ///
    /// Fails with [`McpError::NotReady`], without touching the transport,
    /// unless the handshake has completed.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, McpError> {
        if self.state != SessionState::Ready {
            return Err(McpError::NotReady { state: self.state });
        }

        let params = serde_json::json!({
            "name": name,
            "arguments": arguments,
        });
        let response = self.call("tools/call", Some(params), self.call_timeout).await?;
        let result = response.outcome()?;
        Ok(serde_json::from_value(result)?)
    }

    /// Fail the session on a handshake-stage error, making `Failed` sticky.
    fn check_stage<V>(
        &mut self,
        stage: &'static str,
        result: Result<V, McpError>,
    ) -> Result<V, McpError> {
        result.map_err(|e| {
            self.state = SessionState::Failed;
            tracing::warn!(stage, error = %e, "handshake failed");
            McpError::Handshake {
                stage,
                detail: e.to_string(),
            }
        })
    }
}
