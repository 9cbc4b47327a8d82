//! Directive records: standing instructions for downstream monitoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status assigned to every newly created directive.
pub const DIRECTIVE_STATUS_ACTIVE: &str = "active";

/// A persisted standing instruction for the hunter mechanism.
///
/// Directives are created through the `create_directive` tool and never
/// mutated here; lifecycle transitions belong to downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    /// Store-assigned record id (e.g. `directive:01hx...`).
    pub id: String,
    /// The entity under watch (e.g. "Elon Musk", "$TSLA").
    pub target: String,
    /// Task type ("track_replies", "monitor_sentiment", "fetch_10k").
    #[serde(rename = "type")]
    pub kind: String,
    /// Lifecycle status; starts as "active".
    pub status: String,
    /// Free-form task parameters.
    pub context: Value,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Directive {
    pub fn is_active(&self) -> bool {
        self.status == DIRECTIVE_STATUS_ACTIVE
    }
}
