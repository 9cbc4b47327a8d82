//! HTTP client for the store's stateless statement endpoint.
//!
//! Every execution POSTs a self-contained batch to `/sql` with Basic-auth
//! credentials and namespace/database scope headers, then validates each
//! statement's result independently: any `ERR` entry fails the whole batch
//! with the failing statement's detail attached.

use serde_json::Value;

use abyss_core::SurrealConfig;

use crate::batch::StatementBatch;
use crate::error::StoreError;
use crate::types::{QueryResult, StatementResult};

/// Client for the backing graph store.
///
/// Cheap to clone-share behind an `Arc`; holds no connection state beyond
/// the reqwest connection pool.
pub struct SurrealClient {
    http: reqwest::Client,
    config: SurrealConfig,
}

impl SurrealClient {
    pub fn new(config: SurrealConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &SurrealConfig {
        &self.config
    }

    /// Execute a single statement with bound parameters.
    pub async fn query(
        &self,
        statement: &str,
        params: &[(&str, Value)],
    ) -> Result<QueryResult, StoreError> {
        self.query_batch(&[statement], params).await
    }

    /// Execute a batch of statements with bound parameters.
    ///
    /// The batch executes atomically from the caller's perspective: if any
    /// statement (preamble or caller-submitted) reports `ERR`, the whole
    /// execution fails and no partial payload is returned. On success the
    /// result holds one entry per caller statement, in submission order,
    /// with the scope/binding preamble stripped.
    pub async fn query_batch(
        &self,
        statements: &[&str],
        params: &[(&str, Value)],
    ) -> Result<QueryResult, StoreError> {
        let batch = StatementBatch::build(
            &self.config.namespace,
            &self.config.database,
            statements,
            params,
        )?;
        tracing::debug!(
            statements = batch.statement_count(),
            bindings = batch.preamble_len() - 1,
            "executing statement batch"
        );

        let mut results = self.post_sql(batch.text()).await?;
        if results.len() != batch.total_len() {
            return Err(StoreError::ResultCount {
                expected: batch.total_len(),
                got: results.len(),
            });
        }

        for (index, result) in results.iter().enumerate() {
            if let StatementResult::Err { detail, .. } = result {
                tracing::warn!(index, detail = %detail, "statement failed");
                return Err(if index < batch.preamble_len() {
                    StoreError::Binding {
                        index,
                        detail: detail.clone(),
                    }
                } else {
                    StoreError::Statement {
                        index: index - batch.preamble_len(),
                        detail: detail.clone(),
                    }
                });
            }
        }

        let caller_results = results.split_off(batch.preamble_len());
        Ok(QueryResult::new(caller_results))
    }

    /// Execute a trusted multi-statement script unchanged.
    ///
    /// Used for schema bootstrap: the script declares its own scope, so no
    /// preamble is added and all statement results are returned. Any `ERR`
    /// entry still fails the execution, reporting the statement's position
    /// within the script.
    pub async fn execute_raw(&self, script: &str) -> Result<Vec<StatementResult>, StoreError> {
        let results = self.post_sql(script).await?;
        for (index, result) in results.iter().enumerate() {
            if let StatementResult::Err { detail, .. } = result {
                return Err(StoreError::Statement {
                    index,
                    detail: detail.clone(),
                });
            }
        }
        Ok(results)
    }

    async fn post_sql(&self, body: &str) -> Result<Vec<StatementResult>, StoreError> {
        let response = self
            .http
            .post(self.config.sql_endpoint())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Accept", "application/json")
            .header("Content-Type", "text/plain")
            .header("Surreal-NS", &self.config.namespace)
            .header("Surreal-DB", &self.config.database)
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(StoreError::Api { status, body: text });
        }

        Ok(serde_json::from_str(&text)?)
    }
}
