//! Error types for the store crate.

use thiserror::Error;

/// Errors raised while building or executing a statement batch.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP-level failure reaching the store.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success HTTP status.
    #[error("store returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Encoding a binding or decoding the response failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid parameter name '{0}': expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidParamName(String),

    #[error("duplicate parameter name '{0}'")]
    DuplicateParamName(String),

    #[error("invalid scope identifier '{0}'")]
    InvalidScope(String),

    #[error("statement batch is empty")]
    EmptyBatch,

    /// A scope or binding statement in the batch preamble failed.
    /// `index` is the statement's position within the full batch.
    #[error("scope/binding statement {index} failed: {detail}")]
    Binding { index: usize, detail: String },

    /// A caller statement failed. `index` is relative to the caller's
    /// statements (0 = first submitted statement).
    #[error("statement {index} failed: {detail}")]
    Statement { index: usize, detail: String },

    /// The store reported a different number of results than the batch
    /// submitted, so the response cannot be mapped back to statements.
    #[error("store returned {got} results for a batch of {expected} statements")]
    ResultCount { expected: usize, got: usize },
}
