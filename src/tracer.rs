//! Builds source-to-target row mappings for one model dependency.

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{LineageConfig, LineageMode};
use crate::resolver::TokenResolver;
use crate::vocabulary::{PARENT_TRACE_COLUMN, TRACE_COLUMN};

/// A fetched row, column name to value, in select order.
pub type Row = IndexMap<String, Value>;

/// One resolved lineage edge between a source row and a target row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub source_model: String,
    pub target_model: String,
    pub source_trace_id: String,
    pub target_trace_id: String,
    pub compiled_sql: String,
    pub executed_at: String,
}

/// A dependency between two models, as seen by the tracer.
#[derive(Debug, Clone)]
pub struct TraceEdge {
    pub source_model: String,
    pub target_model: String,
    pub compiled_sql: String,
    /// Aliases under which the target SQL reads the source model.
    pub source_aliases: Vec<String>,
}

impl TraceEdge {
    pub fn new(source_model: &str, target_model: &str, compiled_sql: &str) -> Self {
        Self {
            source_model: source_model.to_owned(),
            target_model: target_model.to_owned(),
            compiled_sql: compiled_sql.to_owned(),
            source_aliases: vec![],
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.source_aliases = aliases;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tracer {
    mode: LineageMode,
}

impl Tracer {
    pub fn new(config: &LineageConfig) -> Self {
        Self::with_mode(config.lineage_mode)
    }

    pub fn with_mode(mode: LineageMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> LineageMode {
        self.mode
    }

    /// Maps target rows back to the source rows they were built from.
    ///
    /// In tokens mode `source_rows` is not read.
    pub fn build_mappings(
        &self,
        edge: &TraceEdge,
        source_rows: &[Row],
        target_rows: &[Row],
    ) -> anyhow::Result<Vec<MappingRecord>> {
        let executed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let record = |source_trace_id: String, target_trace_id: String| MappingRecord {
            source_model: edge.source_model.clone(),
            target_model: edge.target_model.clone(),
            source_trace_id,
            target_trace_id,
            compiled_sql: edge.compiled_sql.clone(),
            executed_at: executed_at.clone(),
        };

        let mut mappings = vec![];
        match self.mode {
            LineageMode::Tokens => {
                let resolver =
                    TokenResolver::new(&edge.source_model).with_aliases(&edge.source_aliases);
                for target_row in target_rows {
                    let source_ids = resolver
                        .resolve_value(column_value(target_row, PARENT_TRACE_COLUMN))
                        .map_err(|err| {
                            anyhow::anyhow!(
                                "Failed to read parent tokens of a {} row: {}",
                                edge.target_model,
                                err
                            )
                        })?;
                    if source_ids.is_empty() {
                        continue;
                    }
                    let target_trace_id = row_trace_id(target_row);
                    for source_trace_id in source_ids {
                        mappings.push(record(source_trace_id, target_trace_id.clone()));
                    }
                }
            }
            LineageMode::Positional => {
                for (source_row, target_row) in source_rows.iter().zip(target_rows) {
                    mappings.push(record(row_trace_id(source_row), row_trace_id(target_row)));
                }
            }
        }
        Ok(mappings)
    }
}

/// Case-insensitive lookup, since some warehouses upper-case column names.
pub fn column_value<'r>(row: &'r Row, name: &str) -> Option<&'r Value> {
    row.get(name).or_else(|| {
        row.iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// The row's stored trace id, or a content-derived one when it has none.
pub fn row_trace_id(row: &Row) -> String {
    match column_value(row, TRACE_COLUMN) {
        Some(Value::String(trace_id)) if !trace_id.is_empty() => trace_id.clone(),
        Some(Value::Null) | Some(Value::String(_)) | None => deterministic_trace_id(row),
        Some(other) => other.to_string(),
    }
}

pub fn deterministic_uuid(seed: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes()).to_string()
}

/// UUIDv5 of the row content, ignoring any stored trace id.
pub fn deterministic_trace_id(row: &Row) -> String {
    let mut scrubbed = row
        .iter()
        .filter(|(column, _)| !column.eq_ignore_ascii_case(TRACE_COLUMN))
        .peekable();
    if scrubbed.peek().is_none() {
        return deterministic_uuid("empty-row");
    }
    deterministic_uuid(&normalize_pairs(scrubbed))
}

fn normalize_pairs<'a>(pairs: impl Iterator<Item = (&'a String, &'a Value)>) -> String {
    let mut pairs = pairs.collect::<Vec<_>>();
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}:{}", key, stringify(value)))
        .collect::<Vec<_>>()
        .join("|")
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Object(object) => normalize_pairs(object.iter()),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(stringify).collect::<Vec<_>>().join(",")
        ),
        Value::Null => "<null>".to_owned(),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    fn edge(source: &str, target: &str) -> TraceEdge {
        TraceEdge::new(source, target, "select 1")
    }

    #[test]
    fn positional_mode_zips_rows() {
        let source = vec![
            row(json!({"_row_trace_id": "s1", "id": 1})),
            row(json!({"_row_trace_id": "s2", "id": 2})),
            row(json!({"_row_trace_id": "s3", "id": 3})),
        ];
        let target = vec![
            row(json!({"_row_trace_id": "t1", "id": 1})),
            row(json!({"id": 2})),
        ];
        let mappings = Tracer::with_mode(LineageMode::Positional)
            .build_mappings(&edge("src", "tgt"), &source, &target)
            .unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].source_trace_id, "s1");
        assert_eq!(mappings[0].target_trace_id, "t1");
        assert_eq!(mappings[1].source_trace_id, "s2");
        assert_eq!(
            mappings[1].target_trace_id,
            deterministic_trace_id(&target[1])
        );
        assert_eq!(mappings[0].executed_at, mappings[1].executed_at);
        assert_eq!(mappings[0].compiled_sql, "select 1");
    }

    #[test]
    fn tokens_mode_follows_aggregation() {
        let target = vec![
            row(json!({
                "_row_trace_id": "north",
                "_row_parent_trace_ids": ["orders:t1", "orders:t2"],
                "region": "north",
                "count": 2
            })),
            row(json!({
                "_row_trace_id": "south",
                "_row_parent_trace_ids": "{orders:t3}",
                "region": "south",
                "count": 1
            })),
        ];
        let mappings = Tracer::default()
            .build_mappings(&edge("orders", "region_counts"), &[], &target)
            .unwrap();
        let pairs = mappings
            .iter()
            .map(|m| (m.source_trace_id.as_str(), m.target_trace_id.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(pairs, vec![("t1", "north"), ("t2", "north"), ("t3", "south")]);
    }

    #[test]
    fn tokens_mode_splits_joins_per_upstream() {
        let target = vec![row(json!({
            "_ROW_TRACE_ID": "t",
            "_ROW_PARENT_TRACE_IDS": "[\"a:u1\", \"b:u2\"]"
        }))];
        let tracer = Tracer::default();
        let from_a = tracer
            .build_mappings(&edge("t1", "joined").with_aliases(vec!["a".into()]), &[], &target)
            .unwrap();
        let from_b = tracer
            .build_mappings(&edge("t2", "joined").with_aliases(vec!["b".into()]), &[], &target)
            .unwrap();
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].source_trace_id, "u1");
        assert_eq!(from_a[0].target_trace_id, "t");
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].source_trace_id, "u2");
    }

    #[test]
    fn rows_without_tokens_map_to_nothing() {
        let target = vec![
            row(json!({"_row_trace_id": "t", "x": 1})),
            row(json!({"_row_trace_id": "u", "_row_parent_trace_ids": null})),
            row(json!({"_row_trace_id": "v", "_row_parent_trace_ids": []})),
        ];
        let mappings = Tracer::default()
            .build_mappings(&edge("orders", "constant"), &[], &target)
            .unwrap();
        assert!(mappings.is_empty());
    }

    #[test]
    fn deterministic_ids_ignore_key_order_and_trace_column() {
        let a = row(json!({"b": 2, "a": [1, null], "c": {"y": true, "x": "s"}}));
        let b = row(json!({"_row_trace_id": "", "c": {"x": "s", "y": true}, "a": [1, null], "b": 2}));
        assert_eq!(deterministic_trace_id(&a), deterministic_trace_id(&b));
        assert_eq!(row_trace_id(&b), deterministic_trace_id(&a));
        assert_eq!(
            deterministic_trace_id(&a),
            deterministic_uuid("a:[1,<null>]|b:2|c:x:s|y:True")
        );
    }

    #[test]
    fn empty_row_seed() {
        assert_eq!(
            deterministic_trace_id(&row(json!({"_row_trace_id": null}))),
            deterministic_uuid("empty-row")
        );
    }
}
