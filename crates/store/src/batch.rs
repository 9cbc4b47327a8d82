//! Statement batch rendering and parameter binding.
//!
//! Statement templates are trusted constants; caller data only ever enters a
//! batch through `LET` bindings rendered by [`encode_value`]. The rendered
//! batch is fully self-contained: scope declaration first, then one binding
//! per parameter, then the caller's statements.

use std::fmt::Write as _;

use serde_json::Value;

use crate::error::StoreError;

/// A rendered execution batch.
///
/// Tracks how many preamble statements (scope + bindings) precede the
/// caller's statements so the executor can map result indexes back to the
/// statements the caller submitted.
#[derive(Debug, Clone)]
pub struct StatementBatch {
    text: String,
    preamble_len: usize,
    statement_count: usize,
}

impl StatementBatch {
    /// Render a batch for the given scope, caller statements, and bindings.
    ///
    /// Statements may be written with or without a trailing `;`. Parameter
    /// names must be identifiers (`[A-Za-z_][A-Za-z0-9_]*`) and unique
    /// within the batch.
    pub fn build(
        namespace: &str,
        database: &str,
        statements: &[&str],
        params: &[(&str, Value)],
    ) -> Result<Self, StoreError> {
        if statements.is_empty() {
            return Err(StoreError::EmptyBatch);
        }
        for scope in [namespace, database] {
            if !is_identifier(scope) {
                return Err(StoreError::InvalidScope(scope.to_string()));
            }
        }

        let mut text = String::new();
        let _ = writeln!(text, "USE NS {namespace} DB {database};");

        for (idx, (name, value)) in params.iter().enumerate() {
            if !is_identifier(name) {
                return Err(StoreError::InvalidParamName(name.to_string()));
            }
            if params[..idx].iter().any(|(prior, _)| prior == name) {
                return Err(StoreError::DuplicateParamName(name.to_string()));
            }
            let _ = writeln!(text, "LET ${name} = {};", encode_value(value)?);
        }

        for statement in statements {
            let statement = statement.trim().trim_end_matches(';').trim_end();
            if statement.is_empty() {
                return Err(StoreError::EmptyBatch);
            }
            let _ = writeln!(text, "{statement};");
        }

        Ok(Self {
            text,
            preamble_len: 1 + params.len(),
            statement_count: statements.len(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of scope/binding statements ahead of the caller's.
    pub fn preamble_len(&self) -> usize {
        self.preamble_len
    }

    /// Number of caller statements.
    pub fn statement_count(&self) -> usize {
        self.statement_count
    }

    /// Total statements the store will report results for.
    pub fn total_len(&self) -> usize {
        self.preamble_len + self.statement_count
    }
}

/// Encode a bound value as an opaque literal for embedding in a batch.
///
/// Values are rendered as canonical JSON. JSON string escaping (`\"`, `\\`,
/// `\n`, `\t`, `\u00XX` for remaining control characters) guarantees the
/// rendered literal cannot close the surrounding binding or introduce
/// statement text, and the store parses the same JSON grammar back to the
/// identical value.
pub fn encode_value(value: &Value) -> Result<String, StoreError> {
    Ok(serde_json::to_string(value)?)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_layout() {
        let batch = StatementBatch::build(
            "abyss",
            "core",
            &["SELECT * FROM directive"],
            &[("target", json!("$TSLA"))],
        )
        .unwrap();

        let lines: Vec<&str> = batch.text().lines().collect();
        assert_eq!(
            lines,
            vec![
                "USE NS abyss DB core;",
                r#"LET $target = "$TSLA";"#,
                "SELECT * FROM directive;",
            ]
        );
        assert_eq!(batch.preamble_len(), 2);
        assert_eq!(batch.statement_count(), 1);
        assert_eq!(batch.total_len(), 3);
    }

    #[test]
    fn trailing_semicolons_are_normalized() {
        let batch =
            StatementBatch::build("abyss", "core", &["SELECT * FROM report; "], &[]).unwrap();
        assert!(batch.text().ends_with("SELECT * FROM report;\n"));
    }

    #[test]
    fn hostile_string_values_stay_literal() {
        let batch = StatementBatch::build(
            "abyss",
            "core",
            &["SELECT * FROM directive WHERE target = $target"],
            &[("target", json!("\"; REMOVE TABLE directive; --\nLET $x"))],
        )
        .unwrap();

        // The binding stays on one line: every quote, backslash, and newline
        // in the value is escaped, so nothing can terminate the LET early.
        let binding = batch.text().lines().nth(1).unwrap();
        assert_eq!(
            binding,
            r#"LET $target = "\"; REMOVE TABLE directive; --\nLET $x";"#
        );
        assert_eq!(batch.text().lines().count(), 3);
    }

    #[test]
    fn nested_values_encode_as_json() {
        let context = json!({"platform": "x", "depth": 2, "tags": ["a", "b"]});
        let batch = StatementBatch::build(
            "abyss",
            "core",
            &["CREATE directive CONTENT { context: $context }"],
            &[("context", context.clone())],
        )
        .unwrap();

        let binding = batch.text().lines().nth(1).unwrap();
        let encoded = binding
            .strip_prefix("LET $context = ")
            .unwrap()
            .strip_suffix(';')
            .unwrap();
        let decoded: Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded, context);
    }

    #[test]
    fn rejects_non_identifier_param_names() {
        for bad in ["1target", "a-b", "x; REMOVE", "", "a b"] {
            let err = StatementBatch::build("abyss", "core", &["SELECT 1"], &[(bad, json!(1))])
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidParamName(_)), "{bad}");
        }
    }

    #[test]
    fn rejects_duplicate_param_names() {
        let err = StatementBatch::build(
            "abyss",
            "core",
            &["SELECT 1"],
            &[("ticker", json!("TSLA")), ("ticker", json!("CATL"))],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateParamName(_)));
    }

    #[test]
    fn rejects_bad_scope_identifiers() {
        let err =
            StatementBatch::build("aby ss", "core", &["SELECT 1"], &[]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidScope(_)));
    }

    #[test]
    fn rejects_empty_batches() {
        assert!(matches!(
            StatementBatch::build("abyss", "core", &[], &[]),
            Err(StoreError::EmptyBatch)
        ));
        assert!(matches!(
            StatementBatch::build("abyss", "core", &["  ;"], &[]),
            Err(StoreError::EmptyBatch)
        ));
    }

    #[test]
    fn encode_round_trips_representable_types() {
        for value in [
            json!("plain"),
            json!(42),
            json!(-7.5),
            json!(true),
            json!(null),
            json!({"nested": {"list": [1, "two", false], "empty": {}}}),
        ] {
            let encoded = encode_value(&value).unwrap();
            let decoded: Value = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, value);
        }
    }
}
