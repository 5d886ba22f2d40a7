//! Fetching materialized rows after the models ran.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::manifest::Relation;
use crate::tracer::{Row, column_value};
use crate::vocabulary::TRACE_COLUMN;

pub trait RowSource {
    /// All rows of `relation`, ordered by trace id when it has one.
    fn fetch_rows(&self, relation: &Relation) -> anyhow::Result<Vec<Row>>;

    fn has_trace_column(&self, relation: &Relation) -> anyhow::Result<bool>;
}

fn has_trace(rows: &[Row]) -> bool {
    rows.first()
        .is_some_and(|row| column_value(row, TRACE_COLUMN).is_some())
}

fn sort_by_trace(rows: &mut [Row]) {
    if has_trace(rows) {
        rows.sort_by_cached_key(|row| match column_value(row, TRACE_COLUMN) {
            Some(serde_json::Value::String(trace_id)) => trace_id.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        });
    }
}

/// Row dumps on disk, one `<schema>.<table>.jsonl` file per relation with
/// one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonlRowSource {
    dir: PathBuf,
}

impl JsonlRowSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, relation: &Relation) -> PathBuf {
        self.dir
            .join(format!("{}.{}.jsonl", relation.schema, relation.table))
    }

    fn read_rows(&self, relation: &Relation) -> anyhow::Result<Vec<Row>> {
        let path = self.path_for(relation);
        let file = std::fs::File::open(&path).map_err(|err| {
            anyhow!(
                "Failed to open rows of {} at {}: {}",
                relation,
                path.display(),
                err
            )
        })?;
        let mut rows = vec![];
        for (idx, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row: Row = serde_json::from_str(&line).map_err(|err| {
                anyhow!(
                    "Invalid row at {}:{} due to error: {}",
                    path.display(),
                    idx + 1,
                    err
                )
            })?;
            rows.push(row);
        }
        log::debug!("Read {} rows of {}", rows.len(), relation);
        Ok(rows)
    }
}

impl RowSource for JsonlRowSource {
    fn fetch_rows(&self, relation: &Relation) -> anyhow::Result<Vec<Row>> {
        let mut rows = self.read_rows(relation)?;
        sort_by_trace(&mut rows);
        Ok(rows)
    }

    fn has_trace_column(&self, relation: &Relation) -> anyhow::Result<bool> {
        Ok(has_trace(&self.read_rows(relation)?))
    }
}

/// Rows held in memory, keyed by relation.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    tables: HashMap<Relation, Vec<Row>>,
}

impl MemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation: Relation, rows: Vec<Row>) {
        self.tables.insert(relation, rows);
    }
}

impl RowSource for MemoryRowSource {
    fn fetch_rows(&self, relation: &Relation) -> anyhow::Result<Vec<Row>> {
        let mut rows = self
            .tables
            .get(relation)
            .cloned()
            .ok_or_else(|| anyhow!("No rows for relation {}", relation))?;
        sort_by_trace(&mut rows);
        Ok(rows)
    }

    fn has_trace_column(&self, relation: &Relation) -> anyhow::Result<bool> {
        Ok(self.tables.get(relation).is_some_and(|rows| has_trace(rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dumps_ordered_by_trace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("main.orders.jsonl"),
            "{\"id\": 2, \"_row_trace_id\": \"b\"}\n\n{\"id\": 1, \"_row_trace_id\": \"a\"}\n",
        )
        .unwrap();
        let source = JsonlRowSource::new(dir.path());
        let relation = Relation::new("main", "orders");
        let rows = source.fetch_rows(&relation).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], serde_json::json!(1));
        assert!(source.has_trace_column(&relation).unwrap());
    }

    #[test]
    fn keeps_file_order_without_trace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.t.jsonl"), "{\"id\": 2}\n{\"id\": 1}\n").unwrap();
        let source = JsonlRowSource::new(dir.path());
        let relation = Relation::new("main", "t");
        let rows = source.fetch_rows(&relation).unwrap();
        assert_eq!(rows[0]["id"], serde_json::json!(2));
        assert!(!source.has_trace_column(&relation).unwrap());
    }

    #[test]
    fn missing_dump_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonlRowSource::new(dir.path());
        assert!(source.fetch_rows(&Relation::new("main", "nope")).is_err());
    }
}
