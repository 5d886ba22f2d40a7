//! The slice of a dbt `manifest.json` that lineage needs: queryable nodes,
//! their physical relations and their dependency edges.

use std::fmt::Display;
use std::path::Path;

use anyhow::anyhow;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::LineageError;

/// Resource types whose relation can be selected from.
pub const QUERYABLE_RESOURCE_TYPES: &[&str] = &["model", "seed", "snapshot"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relation {
    pub schema: String,
    pub table: String,
}

impl Relation {
    pub fn new(schema: &str, table: &str) -> Self {
        Self {
            schema: schema.to_owned(),
            table: table.to_owned(),
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependsOn {
    #[serde(default)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestNode {
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub depends_on: DependsOn,
    #[serde(default)]
    pub compiled_code: Option<String>,
}

impl ManifestNode {
    pub fn is_queryable(&self) -> bool {
        QUERYABLE_RESOURCE_TYPES.contains(&self.resource_type.as_str())
    }

    /// `(schema, alias or name)` of the node's relation.
    pub fn relation(&self) -> anyhow::Result<Relation> {
        let schema = self.schema.as_deref().filter(|schema| !schema.is_empty());
        let table = self
            .alias
            .as_deref()
            .filter(|alias| !alias.is_empty())
            .or(Some(self.name.as_str()).filter(|name| !name.is_empty()));
        match (schema, table) {
            (Some(schema), Some(table)) => Ok(Relation::new(schema, table)),
            _ => Err(LineageError::MissingRelation {
                unique_id: self.unique_id.clone(),
            }
            .into()),
        }
    }
}

/// A queryable node reduced to what the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRef {
    pub unique_id: String,
    pub name: String,
    pub relation: Relation,
    pub compiled_sql: String,
}

impl TryFrom<&ManifestNode> for ModelRef {
    type Error = anyhow::Error;

    fn try_from(node: &ManifestNode) -> Result<Self, Self::Error> {
        Ok(ModelRef {
            unique_id: node.unique_id.clone(),
            name: node.name.clone(),
            relation: node.relation()?,
            compiled_sql: node.compiled_code.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEdge {
    pub upstream: ModelRef,
    pub downstream: ModelRef,
}

/// Where the pipeline learns which model pairs to resolve.
pub trait ModelGraph {
    /// `(upstream, downstream)` pairs in a stable order.
    fn lineage_edges(&self) -> anyhow::Result<Vec<ModelEdge>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub nodes: IndexMap<String, ManifestNode>,
}

impl Manifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(LineageError::ManifestNotFound(path.to_path_buf()).into());
        }
        let source = std::fs::read_to_string(path)
            .map_err(|err| anyhow!("Failed to read manifest {}: {}", path.display(), err))?;
        Self::from_json_str(&source).map_err(|err| {
            anyhow!(
                "Failed to parse JSON manifest in file {} due to error: {}",
                path.display(),
                err
            )
        })
    }

    pub fn from_json_str(source: &str) -> anyhow::Result<Self> {
        let mut manifest: Manifest = serde_json::from_str(source)?;
        for (unique_id, node) in manifest.nodes.iter_mut() {
            if node.unique_id.is_empty() {
                node.unique_id = unique_id.clone();
            }
        }
        Ok(manifest)
    }

    pub fn queryable_nodes(&self) -> impl Iterator<Item = &ManifestNode> {
        self.nodes.values().filter(|node| node.is_queryable())
    }

    /// Dependencies between queryable nodes. Sources, tests and other
    /// non-queryable upstreams are skipped.
    pub fn node_edges(&self) -> Vec<(&ManifestNode, &ManifestNode)> {
        let mut edges = vec![];
        for downstream in self.queryable_nodes() {
            for upstream_id in &downstream.depends_on.nodes {
                match self.nodes.get(upstream_id) {
                    Some(upstream) if upstream.is_queryable() => edges.push((upstream, downstream)),
                    _ => log::debug!(
                        "Skipping non-queryable dependency {} of {}",
                        upstream_id,
                        downstream.unique_id
                    ),
                }
            }
        }
        edges
    }
}

impl ModelGraph for Manifest {
    fn lineage_edges(&self) -> anyhow::Result<Vec<ModelEdge>> {
        self.node_edges()
            .into_iter()
            .map(|(upstream, downstream)| -> anyhow::Result<ModelEdge> {
                Ok(ModelEdge {
                    upstream: upstream.try_into()?,
                    downstream: downstream.try_into()?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "metadata": {"dbt_version": "1.8.0"},
        "nodes": {
            "seed.shop.raw_orders": {
                "name": "raw_orders", "resource_type": "seed", "schema": "main",
                "depends_on": {"nodes": []}
            },
            "model.shop.stg_orders": {
                "name": "stg_orders", "resource_type": "model", "schema": "analytics",
                "alias": "orders_v", "compiled_code": "select * from main.raw_orders",
                "depends_on": {"nodes": ["seed.shop.raw_orders", "source.shop.erp.customers"]}
            },
            "test.shop.not_null": {
                "name": "not_null", "resource_type": "test", "schema": "analytics",
                "depends_on": {"nodes": ["model.shop.stg_orders"]}
            }
        },
        "sources": {}
    }"#;

    #[test]
    fn edges_between_queryable_nodes() {
        let manifest = Manifest::from_json_str(MANIFEST).unwrap();
        assert_eq!(manifest.queryable_nodes().count(), 2);

        let edges = manifest.lineage_edges().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].upstream.name, "raw_orders");
        assert_eq!(edges[0].upstream.relation, Relation::new("main", "raw_orders"));
        assert_eq!(edges[0].downstream.unique_id, "model.shop.stg_orders");
        assert_eq!(
            edges[0].downstream.relation,
            Relation::new("analytics", "orders_v")
        );
        assert_eq!(edges[0].downstream.compiled_sql, "select * from main.raw_orders");
        assert_eq!(edges[0].upstream.compiled_sql, "");
    }

    #[test]
    fn relation_needs_schema() {
        let node = ManifestNode {
            unique_id: "model.x.y".to_owned(),
            name: "y".to_owned(),
            resource_type: "model".to_owned(),
            ..Default::default()
        };
        let err = node.relation().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LineageError>(),
            Some(LineageError::MissingRelation { unique_id }) if unique_id == "model.x.y"
        ));
    }

    #[test]
    fn missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("manifest.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LineageError>(),
            Some(LineageError::ManifestNotFound(_))
        ));
    }
}
