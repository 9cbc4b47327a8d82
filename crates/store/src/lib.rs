//! Query execution against the backing graph store.
//!
//! The store speaks a stateless request/response protocol: each HTTP request
//! carries a multi-statement SurrQL batch and returns one result per
//! statement, in order. Nothing set by one request survives to the next, so
//! every execution ships its own scope declaration and parameter bindings
//! ahead of the caller's statements.
//!
//! # Architecture
//!
//! - **types**: tagged per-statement results and the caller-visible
//!   `QueryResult`
//! - **batch**: batch rendering and the audited parameter-binding encoding
//! - **client**: the HTTP client, per-statement validation, raw script
//!   execution
//! - **error**: unified error type

pub mod batch;
pub mod client;
pub mod error;
pub mod types;

pub use batch::StatementBatch;
pub use client::SurrealClient;
pub use error::StoreError;
pub use types::{QueryResult, StatementResult};
