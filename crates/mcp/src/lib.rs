//! MCP (Model Context Protocol) bridge for the abyss intelligence tools.
//!
//! Implements JSON-RPC 2.0 over newline-delimited streams, in both
//! directions: a server loop that exposes a `ToolRegistry` on stdio, and a
//! client that spawns a tool-server subprocess, drives the fixed
//! initialize → initialized → tools/list handshake, and correlates tool
//! calls with their responses under per-call deadlines.
//!
//! # Architecture
//!
//! - **types**: JSON-RPC 2.0 and MCP protocol types, plus the tagged
//!   `Message` classifier for inbound lines
//! - **transport**: pluggable transport layer (subprocess pipes, stdio,
//!   in-memory channels)
//! - **client**: request correlation and the session handshake state machine
//! - **catalog**: advertised-tool catalog and the search-tool selection rules
//! - **server**: MCP server wrapping a `ToolRegistry`
//! - **error**: unified error types

pub mod catalog;
pub mod client;
pub mod error;
pub mod server;
pub mod transport;
pub mod types;

pub use catalog::ToolCatalog;
pub use client::{McpClient, SessionState, DEFAULT_CALL_TIMEOUT, HANDSHAKE_TIMEOUT};
pub use error::McpError;
pub use server::McpServer;
pub use transport::{ChannelTransport, McpTransport, ProcessTransport, StdioTransport};
pub use types::*;
