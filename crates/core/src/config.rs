use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub surreal: SurrealConfig,
    pub harness: HarnessConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            surreal: SurrealConfig::from_env(),
            harness: HarnessConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  surreal:  endpoint={}, ns={}, db={}, user={}",
            self.surreal.sql_endpoint(),
            self.surreal.namespace,
            self.surreal.database,
            self.surreal.username,
        );
        tracing::info!(
            "  harness:  servers_file={}, call_timeout={}s, settle_delay={}ms",
            self.harness.servers_file.display(),
            self.harness.call_timeout_secs,
            self.harness.settle_delay_ms,
        );
    }
}

// ── SurrealDB ─────────────────────────────────────────────────

/// Connection settings for the backing graph store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrealConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
}

impl SurrealConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("SURREAL_HOST", "localhost"),
            port: env_u16("SURREAL_PORT", 8000),
            username: env_or("SURREAL_USER", "root"),
            password: env_or("SURREAL_PASS", "root"),
            namespace: env_or("SURREAL_NS", "abyss"),
            database: env_or("SURREAL_DB", "core"),
        }
    }

    /// URL of the stateless statement endpoint.
    pub fn sql_endpoint(&self) -> String {
        format!("http://{}:{}/sql", self.host, self.port)
    }
}

// ── Probe harness ─────────────────────────────────────────────

/// Settings for the conformance probe run against configured tool servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Path to the server map (`.mcp.json` shape).
    pub servers_file: PathBuf,
    /// Per-call deadline for tool invocations, in seconds.
    pub call_timeout_secs: u64,
    /// Pause between sequential server sessions, in milliseconds.
    pub settle_delay_ms: u64,
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        Self {
            servers_file: PathBuf::from(env_or("MCP_SERVERS_FILE", ".mcp.json")),
            call_timeout_secs: env_u64("MCP_CALL_TIMEOUT_SECS", 15),
            settle_delay_ms: env_u64("MCP_SETTLE_DELAY_MS", 1000),
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
