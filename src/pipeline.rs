//! Project-wide lineage: every dependency edge of the model graph is
//! resolved against the materialized rows and written to a sink.

use std::time::Instant;

use serde::Serialize;

use crate::config::{LineageConfig, LineageMode};
use crate::instrument::source_bindings;
use crate::manifest::{ModelEdge, ModelGraph};
use crate::rows::RowSource;
use crate::sink::MappingSink;
use crate::tracer::{MappingRecord, TraceEdge, Tracer};
use crate::vocabulary::TRACE_COLUMN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSummary {
    pub upstream: String,
    pub downstream: String,
    pub mappings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Disabled,
    Completed {
        edges: Vec<EdgeSummary>,
        records: Vec<MappingRecord>,
    },
}

impl PipelineOutcome {
    pub fn records(&self) -> &[MappingRecord] {
        match self {
            PipelineOutcome::Disabled => &[],
            PipelineOutcome::Completed { records, .. } => records,
        }
    }
}

/// Aliases under which the downstream SQL reads the upstream relation,
/// plus the relation name itself. An alias the SQL also binds to another
/// relation is left out, since its tokens cannot be told apart.
fn upstream_aliases(edge: &ModelEdge, config: &LineageConfig) -> Vec<String> {
    let relation = &edge.upstream.relation;
    let bindings = match source_bindings(&edge.downstream.compiled_sql, config.dialect.as_ref()) {
        Ok(bindings) => bindings,
        Err(err) => {
            log::warn!(
                "Cannot read source aliases of {}: {}",
                edge.downstream.unique_id,
                err
            );
            return vec![relation.table.clone()];
        }
    };

    let mut aliases = vec![relation.table.clone()];
    for binding in &bindings {
        if binding.refers_to(&relation.schema, &relation.table)
            && !aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(&binding.alias))
        {
            aliases.push(binding.alias.clone());
        }
    }
    aliases.retain(|alias| {
        let ambiguous = bindings.iter().any(|binding| {
            binding.alias.eq_ignore_ascii_case(alias)
                && !binding.refers_to(&relation.schema, &relation.table)
        });
        if ambiguous {
            log::warn!(
                "Ignoring alias `{}` of {} in {}: it also names another relation.",
                alias,
                relation,
                edge.downstream.unique_id
            );
        }
        !ambiguous
    });
    aliases
}

pub fn generate_lineage_for_project(
    graph: &dyn ModelGraph,
    rows: &dyn RowSource,
    sink: &mut dyn MappingSink,
    config: &LineageConfig,
) -> anyhow::Result<PipelineOutcome> {
    if !config.enabled {
        log::warn!("Row lineage is disabled: no mappings generated.");
        return Ok(PipelineOutcome::Disabled);
    }

    let now = Instant::now();
    let tracer = Tracer::new(config);
    let mut edges = vec![];
    let mut records = vec![];

    for edge in graph.lineage_edges()? {
        let target_rows = rows.fetch_rows(&edge.downstream.relation)?;
        if tracer.mode() == LineageMode::Tokens
            && !target_rows.is_empty()
            && !rows.has_trace_column(&edge.downstream.relation)?
        {
            log::warn!(
                "Rows of {} have no {} column, falling back to deterministic trace ids.",
                edge.downstream.relation,
                TRACE_COLUMN
            );
        }
        let source_rows = match tracer.mode() {
            LineageMode::Positional => rows.fetch_rows(&edge.upstream.relation)?,
            LineageMode::Tokens => vec![],
        };

        let trace_edge = TraceEdge::new(
            &edge.upstream.name,
            &edge.downstream.name,
            &edge.downstream.compiled_sql,
        )
        .with_aliases(upstream_aliases(&edge, config));
        let mappings = tracer.build_mappings(&trace_edge, &source_rows, &target_rows)?;
        log::info!(
            "{} -> {}: {} mappings",
            edge.upstream.name,
            edge.downstream.name,
            mappings.len()
        );

        if !mappings.is_empty() {
            sink.write(&mappings)?;
        }
        edges.push(EdgeSummary {
            upstream: edge.upstream.unique_id.clone(),
            downstream: edge.downstream.unique_id.clone(),
            mappings: mappings.len(),
        });
        records.extend(mappings);
    }

    log::info!("Lineage for {} edges in {:.2?}", edges.len(), now.elapsed());
    Ok(PipelineOutcome::Completed { edges, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::manifest::Relation;
    use crate::rows::MemoryRowSource;
    use crate::sink::MemorySink;
    use crate::tracer::Row;
    use serde_json::json;

    const MANIFEST: &str = r#"{
        "nodes": {
            "seed.shop.orders": {
                "name": "orders", "resource_type": "seed", "schema": "main"
            },
            "seed.shop.customers": {
                "name": "customers", "resource_type": "seed", "schema": "main"
            },
            "model.shop.enriched": {
                "name": "enriched", "resource_type": "model", "schema": "analytics",
                "compiled_code": "select o.id, c.name from main.orders o join main.customers c on o.customer_id = c.id",
                "depends_on": {"nodes": ["seed.shop.orders", "seed.shop.customers"]}
            }
        }
    }"#;

    fn row(value: serde_json::Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    fn rows() -> MemoryRowSource {
        let mut rows = MemoryRowSource::new();
        rows.insert(
            Relation::new("main", "orders"),
            vec![row(json!({"_row_trace_id": "o1", "id": 1, "customer_id": 7}))],
        );
        rows.insert(
            Relation::new("main", "customers"),
            vec![row(json!({"_row_trace_id": "c7", "id": 7, "name": "ada"}))],
        );
        rows.insert(
            Relation::new("analytics", "enriched"),
            vec![row(json!({
                "_row_trace_id": "e1",
                "_row_parent_trace_ids": ["o:o1", "c:c7"],
                "id": 1,
                "name": "ada"
            }))],
        );
        rows
    }

    #[test]
    fn join_edges_resolve_through_aliases() {
        let manifest = Manifest::from_json_str(MANIFEST).unwrap();
        let mut sink = MemorySink::default();
        let outcome =
            generate_lineage_for_project(&manifest, &rows(), &mut sink, &LineageConfig::default())
                .unwrap();

        let PipelineOutcome::Completed { edges, records } = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|edge| edge.mappings == 1));
        let pairs = records
            .iter()
            .map(|r| (r.source_model.as_str(), r.source_trace_id.as_str(), r.target_trace_id.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(pairs, vec![("orders", "o1", "e1"), ("customers", "c7", "e1")]);
        assert_eq!(sink.records, records);
    }

    #[test]
    fn aliases_shared_by_two_relations_are_ignored() {
        let manifest = MANIFEST.replace(
            "select o.id, c.name from main.orders o join main.customers c on o.customer_id = c.id",
            "select a.id, b.name from (select * from main.orders x) a join (select * from main.customers x) b on a.customer_id = b.id",
        );
        let manifest = Manifest::from_json_str(&manifest).unwrap();
        let mut rows = rows();
        rows.insert(
            Relation::new("analytics", "enriched"),
            vec![row(json!({
                "_row_trace_id": "e1",
                "_row_parent_trace_ids": ["x:o1", "x:c7"],
                "id": 1,
                "name": "ada"
            }))],
        );
        let mut sink = MemorySink::default();
        let outcome =
            generate_lineage_for_project(&manifest, &rows, &mut sink, &LineageConfig::default())
                .unwrap();

        let PipelineOutcome::Completed { edges, records } = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|edge| edge.mappings == 0));
        assert!(records.is_empty());
        assert!(sink.records.is_empty());
    }

    #[test]
    fn disabled_run_writes_nothing() {
        let manifest = Manifest::from_json_str(MANIFEST).unwrap();
        let mut sink = MemorySink::default();
        let config = LineageConfig {
            enabled: false,
            ..Default::default()
        };
        let outcome = generate_lineage_for_project(&manifest, &rows(), &mut sink, &config).unwrap();
        assert_eq!(outcome, PipelineOutcome::Disabled);
        assert!(outcome.records().is_empty());
        assert!(sink.records.is_empty());
    }
}
