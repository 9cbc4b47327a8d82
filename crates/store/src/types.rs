//! Wire types for the store's per-statement result reporting.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single statement within an execution batch.
///
/// The store reports one entry per submitted statement, in submission order,
/// discriminated by the `status` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum StatementResult {
    #[serde(rename = "OK")]
    Ok {
        #[serde(default)]
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time: Option<String>,
    },
    #[serde(rename = "ERR")]
    Err {
        #[serde(default)]
        detail: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time: Option<String>,
    },
}

impl StatementResult {
    pub fn is_err(&self) -> bool {
        matches!(self, StatementResult::Err { .. })
    }

    /// Error detail, if this statement failed.
    pub fn detail(&self) -> Option<&str> {
        match self {
            StatementResult::Err { detail, .. } => Some(detail),
            StatementResult::Ok { .. } => None,
        }
    }

    /// Rows of a successful statement. A non-array result (e.g. the `null`
    /// produced by a `LET`) yields an empty slice.
    pub fn rows(&self) -> &[Value] {
        match self {
            StatementResult::Ok {
                result: Value::Array(rows),
                ..
            } => rows,
            _ => &[],
        }
    }

    pub fn first_row(&self) -> Option<&Value> {
        self.rows().first()
    }
}

/// Ordered per-statement outcomes for the caller's statements in one batch.
///
/// Index 0 corresponds to the first caller statement; scope and binding
/// preamble results are validated by the executor and stripped before this
/// value is built. Every contained statement is `OK`: a batch with any
/// `ERR` entry fails as a whole and never produces a `QueryResult`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct QueryResult {
    statements: Vec<StatementResult>,
}

impl QueryResult {
    pub(crate) fn new(statements: Vec<StatementResult>) -> Self {
        Self { statements }
    }

    /// Number of caller statements in the batch.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statement(&self, index: usize) -> Option<&StatementResult> {
        self.statements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatementResult> {
        self.statements.iter()
    }

    /// Rows of the statement at `index`; empty if out of range or row-less.
    pub fn rows(&self, index: usize) -> &[Value] {
        self.statements.get(index).map(|s| s.rows()).unwrap_or(&[])
    }

    /// Rows of the final statement, the usual payload of a lookup batch.
    pub fn last_rows(&self) -> &[Value] {
        self.statements.last().map(|s| s.rows()).unwrap_or(&[])
    }

    pub fn into_statements(self) -> Vec<StatementResult> {
        self.statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_ok_with_rows() {
        let json = r#"{"status":"OK","time":"1.2ms","result":[{"id":"company:catl"}]}"#;
        let result: StatementResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_err());
        assert_eq!(result.rows().len(), 1);
        assert_eq!(result.first_row().unwrap()["id"], "company:catl");
    }

    #[test]
    fn decode_ok_with_null_result() {
        // A LET statement reports OK with a null result.
        let json = r#"{"status":"OK","time":"12us","result":null}"#;
        let result: StatementResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_err());
        assert!(result.rows().is_empty());
    }

    #[test]
    fn decode_err_with_detail() {
        let json = r#"{"status":"ERR","detail":"Parse error on line 1"}"#;
        let result: StatementResult = serde_json::from_str(json).unwrap();
        assert!(result.is_err());
        assert_eq!(result.detail(), Some("Parse error on line 1"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let json = r#"{"status":"PENDING","result":[]}"#;
        assert!(serde_json::from_str::<StatementResult>(json).is_err());
    }

    #[test]
    fn query_result_accessors() {
        let result = QueryResult::new(vec![
            StatementResult::Ok {
                result: Value::Null,
                time: None,
            },
            StatementResult::Ok {
                result: serde_json::json!([{"ticker": "TSLA"}]),
                time: None,
            },
        ]);
        assert_eq!(result.len(), 2);
        assert!(result.rows(0).is_empty());
        assert_eq!(result.last_rows().len(), 1);
        assert_eq!(result.last_rows()[0]["ticker"], "TSLA");
        assert!(result.rows(5).is_empty());
    }

    #[test]
    fn empty_rows_are_not_an_error() {
        let result = QueryResult::new(vec![StatementResult::Ok {
            result: serde_json::json!([]),
            time: None,
        }]);
        assert!(!result.statement(0).unwrap().is_err());
        assert!(result.rows(0).is_empty());
    }
}
