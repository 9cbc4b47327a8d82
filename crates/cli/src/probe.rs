//! Conformance probe: drives the full session sequence against each
//! configured tool server.
//!
//! Servers are probed one at a time, each with its own subprocess, id
//! space, and timeout clock; one server hanging or crashing only costs its
//! own probe. A short settling delay separates sequential sessions.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use abyss_core::HarnessConfig;
use abyss_mcp::McpClient;

/// Server map in the `.mcp.json` shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ServersFile {
    #[serde(rename = "mcpServers", default)]
    pub servers: HashMap<String, ServerSpec>,
}

/// One configured tool server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSpec {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ServersFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read server map {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse server map {}", path.display()))
    }

    /// Names of stdio servers, sorted for a deterministic probe order.
    pub fn stdio_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .servers
            .iter()
            .filter(|(_, spec)| spec.kind == "stdio")
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Probe every selected server, isolating failures per server.
pub async fn run(
    harness: &HarnessConfig,
    servers_file: &Path,
    only: Option<&str>,
    query: &str,
    preferred_tool: Option<&str>,
) -> Result<()> {
    let file = ServersFile::load(servers_file)?;
    let names: Vec<&str> = match only {
        Some(name) => vec![name],
        None => file.stdio_names(),
    };
    if names.is_empty() {
        warn!("no stdio servers configured, nothing to probe");
        return Ok(());
    }

    for (index, name) in names.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(harness.settle_delay()).await;
        }
        probe_server(&file, harness, name, query, preferred_tool).await;
    }
    Ok(())
}

async fn probe_server(
    file: &ServersFile,
    harness: &HarnessConfig,
    name: &str,
    query: &str,
    preferred_tool: Option<&str>,
) {
    info!(server = %name, "probing tool server");

    let Some(spec) = file.servers.get(name) else {
        error!(server = %name, "server not found in config");
        return;
    };
    if spec.kind != "stdio" {
        warn!(server = %name, kind = %spec.kind, "skipping: only stdio servers are probed");
        return;
    }

    let mut client = match McpClient::spawn(&spec.command, &spec.args, &spec.env).await {
        Ok(client) => client.with_call_timeout(harness.call_timeout()),
        Err(e) => {
            error!(server = %name, error = %e, "session setup failed");
            return;
        }
    };
    info!(server = %name, tools = ?client.catalog().names(), "tools discovered");

    let Some(tool) = client.catalog().select(preferred_tool) else {
        warn!(server = %name, "no tools advertised");
        client.shutdown().await;
        return;
    };
    let tool_name = tool.name.clone();

    info!(server = %name, tool = %tool_name, query, "invoking tool");
    match client.call_tool(&tool_name, json!({"query": query})).await {
        Ok(result) if !result.is_error => {
            info!(server = %name, preview = %preview(&result.text_content()), "call succeeded");
        }
        Ok(result) => {
            warn!(server = %name, preview = %preview(&result.text_content()), "tool reported an error");
        }
        Err(e) => {
            error!(server = %name, error = %e, "call failed");
        }
    }

    client.shutdown().await;
}

/// First 200 characters, newlines flattened.
fn preview(text: &str) -> String {
    text.replace('\n', " ").chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "mcpServers": {
            "tavily": {
                "type": "stdio",
                "command": "npx",
                "args": ["-y", "tavily-mcp"],
                "env": {"TAVILY_API_KEY": "tvly-test"}
            },
            "brave-search": {
                "type": "stdio",
                "command": "npx",
                "args": ["-y", "@modelcontextprotocol/server-brave-search"],
                "env": {"BRAVE_API_KEY": "bsa-test"}
            },
            "hosted-search": {
                "type": "http",
                "command": "unused"
            }
        }
    }"#;

    #[test]
    fn parses_server_map() {
        let file: ServersFile = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(file.servers.len(), 3);
        let tavily = &file.servers["tavily"];
        assert_eq!(tavily.kind, "stdio");
        assert_eq!(tavily.command, "npx");
        assert_eq!(tavily.args, vec!["-y", "tavily-mcp"]);
        assert_eq!(tavily.env["TAVILY_API_KEY"], "tvly-test");
    }

    #[test]
    fn stdio_names_are_filtered_and_sorted() {
        let file: ServersFile = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(file.stdio_names(), vec!["brave-search", "tavily"]);
    }

    #[test]
    fn missing_fields_default() {
        let file: ServersFile =
            serde_json::from_str(r#"{"mcpServers": {"x": {"command": "echo"}}}"#).unwrap();
        let spec = &file.servers["x"];
        assert!(spec.kind.is_empty());
        assert!(spec.args.is_empty());
        assert!(spec.env.is_empty());
    }

    #[test]
    fn preview_flattens_and_truncates() {
        let text = "line one\nline two".to_string() + &"x".repeat(300);
        let p = preview(&text);
        assert_eq!(p.chars().count(), 200);
        assert!(!p.contains('\n'));
    }
}
