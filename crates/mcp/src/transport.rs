//! MCP transport layer.
//!
//! Defines the `McpTransport` trait for sending/receiving newline-delimited
//! JSON-RPC messages, with implementations for a spawned tool-server
//! subprocess (client side), the current process's stdio (server side), and
//! in-memory channels (tests).

use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::McpError;

/// Trait for MCP message transport.
///
/// Implementations handle the wire framing (one JSON message per line) over
/// different channels.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Read the next message line from the transport.
    /// Returns `None` when the transport is closed.
    async fn receive(&mut self) -> Result<Option<String>, McpError>;

    /// Write a message line to the transport. The frame is flushed
    /// immediately; the remote side is line-oriented and must see it
    /// without buffering delay.
    async fn send(&mut self, message: &str) -> Result<(), McpError>;
}

// ── Subprocess transport ────────────────────────────────────────────

/// Transport over a spawned tool-server subprocess.
///
/// The child's stdin/stdout carry the protocol; its stderr is inherited
/// unmodified so server diagnostics land on the parent's stderr. The child
/// is killed when the transport is dropped, so a session that fails halfway
/// through its handshake still releases the process.
#[derive(Debug)]
pub struct ProcessTransport {
    child: Child,
    reader: BufReader<ChildStdout>,
    writer: ChildStdin,
}

impl ProcessTransport {
    /// Spawn a tool-server process.
    ///
    /// The child inherits the parent environment with `env_overrides`
    /// applied on top. Spawn failures (missing executable, permissions)
    /// surface here, not on first use.
    pub fn spawn(
        program: &str,
        args: &[String],
        env_overrides: &HashMap<String, String>,
    ) -> Result<Self, McpError> {
        tracing::info!(program = %program, "spawning tool server process");

        let mut child = Command::new(program)
            .args(args)
            .envs(env_overrides)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| McpError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let writer = child.stdin.take().ok_or_else(|| McpError::Spawn {
            program: program.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "child stdin not captured",
            ),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| McpError::Spawn {
            program: program.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "child stdout not captured",
            ),
        })?;

        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            writer,
        })
    }

    /// Request process shutdown and reap it.
    ///
    /// Idempotent: safe to call repeatedly and after the process has
    /// already exited.
    pub async fn terminate(&mut self) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

#[async_trait]
impl McpTransport for ProcessTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Ok(None); // EOF
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

// ── Stdio transport ─────────────────────────────────────────────────

/// Stdio-based transport for the server side.
///
/// Reads from stdin, writes to stdout. Each message is a single JSON
/// object terminated by a newline character.
pub struct StdioTransport {
    reader: BufReader<tokio::io::Stdin>,
    writer: tokio::io::Stdout,
}

impl StdioTransport {
    /// Create a new stdio transport.
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Ok(None); // EOF
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

// ── Channel transport ───────────────────────────────────────────────

/// In-memory transport for testing, backed by channel pairs.
pub struct ChannelTransport {
    rx: tokio::sync::mpsc::Receiver<String>,
    tx: tokio::sync::mpsc::Sender<String>,
}

impl ChannelTransport {
    /// Create a pair of connected transports for testing.
    ///
    /// Messages sent on one transport are received by the other.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = tokio::sync::mpsc::channel(32);
        let (tx_b, rx_a) = tokio::sync::mpsc::channel(32);
        (
            Self { rx: rx_a, tx: tx_a },
            Self { rx: rx_b, tx: tx_b },
        )
    }
}

#[async_trait]
impl McpTransport for ChannelTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        Ok(self.rx.recv().await)
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.tx
            .send(message.to_string())
            .await
            .map_err(|e| {
                McpError::Transport(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
            })?;
        Ok(())
    }
}
