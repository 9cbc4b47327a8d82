//! abyss: intelligence tool server and conformance harness.
//!
//! Subcommands:
//! - `serve`: expose the intelligence tools over MCP on stdio
//! - `probe`: spawn configured tool servers and run the full
//!   initialize → initialized → tools/list → tools/call sequence
//! - `init-schema`: apply the schema bootstrap script to the store

mod probe;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use abyss_core::config::{load_dotenv, Config};
use abyss_mcp::{McpServer, StdioTransport};
use abyss_store::SurrealClient;
use abyss_tool_runtime::intelligence_registry;

#[derive(Parser, Debug)]
#[command(name = "abyss", version, about = "Abyss intelligence tool server and harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the intelligence tool server on stdio.
    Serve,
    /// Probe configured tool servers end to end.
    Probe {
        /// Path to the server map (.mcp.json shape). Defaults to the
        /// configured harness file.
        #[arg(long)]
        servers: Option<PathBuf>,
        /// Probe a single named server instead of every stdio entry.
        #[arg(long)]
        server: Option<String>,
        /// Query forwarded to the selected search tool.
        #[arg(long, default_value = "Project Abyss Agent")]
        query: String,
        /// Exact tool name to invoke, bypassing the selection rules.
        #[arg(long)]
        tool: Option<String>,
    },
    /// Apply the schema bootstrap script to the store.
    InitSchema {
        /// Path to the SurrQL script.
        #[arg(long, default_value = "scripts/init_db.surql")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr: in serve mode, stdout belongs to the
    // protocol stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let config = Config::from_env();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => serve(&config).await,
        Command::Probe {
            servers,
            server,
            query,
            tool,
        } => {
            let servers = servers.unwrap_or_else(|| config.harness.servers_file.clone());
            probe::run(
                &config.harness,
                &servers,
                server.as_deref(),
                &query,
                tool.as_deref(),
            )
            .await
        }
        Command::InitSchema { file } => init_schema(&config, &file).await,
    }
}

async fn serve(config: &Config) -> Result<()> {
    config.log_summary();
    let store = Arc::new(SurrealClient::new(config.surreal.clone()));
    let registry = intelligence_registry().context("failed to build tool registry")?;
    let mut server = McpServer::new(registry, store);
    let mut transport = StdioTransport::new();
    server
        .run(&mut transport)
        .await
        .context("server loop failed")?;
    Ok(())
}

async fn init_schema(config: &Config, file: &Path) -> Result<()> {
    let script = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read schema script {}", file.display()))?;
    info!(
        path = %file.display(),
        target = %config.surreal.sql_endpoint(),
        "applying schema script"
    );

    let store = SurrealClient::new(config.surreal.clone());
    let results = store
        .execute_raw(&script)
        .await
        .context("schema bootstrap failed")?;
    info!(statements = results.len(), "schema initialized");

    // The script closes with INFO FOR DB; show its output.
    if let Some(last) = results.last() {
        println!("{}", serde_json::to_string_pretty(last)?);
    }
    Ok(())
}
