//! Rewrites compiled SQL so every produced relation carries the trace and
//! parent-tokens columns.
//!
//! Instrumentation is best-effort. Statements that cannot be parsed, or whose
//! result would change once they carry the reserved columns, are passed
//! through untouched and reported as [`StatementOutcome::Passthrough`].

mod injector;
mod provenance;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::LineageConfig;
use crate::dialect::Dialect;
use crate::emitter::{STATEMENT_SEPARATOR, emit_statement};
use crate::error::LineageError;
use crate::parser::parse_sql_statements;
use injector::{InjectOptions, Injector};

pub use injector::SourceBinding;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatementOutcome {
    /// At least one block received the reserved columns.
    Instrumented,
    /// Parsed, but there was nothing to add.
    Unchanged,
    /// Kept verbatim because it could not be parsed.
    Passthrough { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Instrumented {
    Disabled {
        sql: String,
    },
    Rewritten {
        sql: String,
        statements: Vec<StatementOutcome>,
    },
}

impl Instrumented {
    pub fn sql(&self) -> &str {
        match self {
            Instrumented::Disabled { sql } | Instrumented::Rewritten { sql, .. } => sql,
        }
    }

    pub fn into_sql(self) -> String {
        match self {
            Instrumented::Disabled { sql } | Instrumented::Rewritten { sql, .. } => sql,
        }
    }

    /// Whether any statement was actually rewritten.
    pub fn is_instrumented(&self) -> bool {
        match self {
            Instrumented::Disabled { .. } => false,
            Instrumented::Rewritten { statements, .. } => statements
                .iter()
                .any(|outcome| *outcome == StatementOutcome::Instrumented),
        }
    }
}

/// Instrumentation entry point, with the capability flag resolved once.
#[derive(Debug, Clone, Copy)]
pub struct Instrumenter {
    enabled: bool,
    dialect: Dialect,
}

impl Instrumenter {
    pub fn new(config: &LineageConfig) -> Self {
        if !config.enabled {
            log::warn!("Row lineage is disabled: compiled SQL is left as is.");
        }
        Self {
            enabled: config.enabled,
            dialect: config.dialect,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn instrument(&self, sql: &str) -> Instrumented {
        if !self.enabled {
            return Instrumented::Disabled {
                sql: sql.to_owned(),
            };
        }
        let (sql, statements) = rewrite(sql, self.dialect);
        Instrumented::Rewritten { sql, statements }
    }
}

fn inject_options(dialect: Dialect) -> InjectOptions {
    InjectOptions {
        exclude_reserved_from_stars: dialect.supports_star_exclude(),
    }
}

fn rewrite(sql: &str, dialect: Dialect) -> (String, Vec<StatementOutcome>) {
    let parsed = match parse_sql_statements(sql, dialect) {
        Ok(parsed) => parsed,
        Err(err) => {
            log::warn!(
                "Failed to scan SQL (dialect={}), returning original: {}",
                dialect,
                err
            );
            return (
                sql.to_owned(),
                vec![StatementOutcome::Passthrough {
                    reason: err.to_string(),
                }],
            );
        }
    };

    let mut outcomes = Vec::with_capacity(parsed.len());
    let mut pieces = Vec::with_capacity(parsed.len());
    for parsed_statement in parsed {
        match parsed_statement.statement {
            Ok(mut statement) => {
                let mut injector = Injector::new(inject_options(dialect));
                injector.statement(&mut statement);
                if let Some(message) = injector.unsupported() {
                    let reason = LineageError::Unsupported {
                        statement: parsed_statement.sql.clone(),
                        message: message.to_owned(),
                    }
                    .to_string();
                    log::warn!("Keeping statement as is: {}", reason);
                    pieces.push(parsed_statement.sql);
                    outcomes.push(StatementOutcome::Passthrough { reason });
                } else if injector.changed() {
                    pieces.push(emit_statement(&statement, dialect));
                    outcomes.push(StatementOutcome::Instrumented);
                } else {
                    pieces.push(parsed_statement.sql);
                    outcomes.push(StatementOutcome::Unchanged);
                }
            }
            Err(err) => {
                let reason = LineageError::Parse {
                    statement: parsed_statement.sql.clone(),
                    message: err.to_string(),
                }
                .to_string();
                log::warn!(
                    "Failed to parse statement (dialect={}), keeping it as is: {}",
                    dialect,
                    reason
                );
                pieces.push(parsed_statement.sql);
                outcomes.push(StatementOutcome::Passthrough { reason });
            }
        }
    }

    if !outcomes.contains(&StatementOutcome::Instrumented) {
        return (sql.to_owned(), outcomes);
    }
    (pieces.join(STATEMENT_SEPARATOR), outcomes)
}

/// Best-effort instrumentation of compiled SQL.
///
/// Unknown dialects and unparsable SQL give back `sql` unchanged.
pub fn patch_compiled_sql(sql: &str, dialect: &str) -> String {
    match Dialect::parse(dialect) {
        Ok(dialect) => rewrite(sql, dialect).0,
        Err(err) => {
            log::warn!("{}, returning original SQL", err);
            sql.to_owned()
        }
    }
}

/// Instruments many models at once. The output keeps the input order.
pub fn instrument_many(sqls: &[&str], dialect: &str, parallel: bool) -> Vec<String> {
    if parallel {
        let n_chunks = std::cmp::max(
            1,
            sqls.len()
                / std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1),
        );
        sqls.par_chunks(n_chunks)
            .flat_map(|sqls| _instrument_many(sqls, dialect))
            .collect()
    } else {
        _instrument_many(sqls, dialect)
    }
}

fn _instrument_many(sqls: &[&str], dialect: &str) -> Vec<String> {
    sqls.iter()
        .map(|sql| patch_compiled_sql(sql, dialect))
        .collect()
}

/// Lists the `(alias, relation)` pairs whose rows contribute tokens in the
/// instrumented form of `sql`.
///
/// Statements that fail to parse or are kept as is contribute no bindings.
pub fn source_bindings(sql: &str, dialect: &str) -> anyhow::Result<Vec<SourceBinding>> {
    let dialect = Dialect::parse(dialect)?;
    let mut bindings = vec![];
    for parsed_statement in parse_sql_statements(sql, dialect)? {
        let Ok(mut statement) = parsed_statement.statement else {
            continue;
        };
        let mut injector = Injector::new(inject_options(dialect));
        injector.statement(&mut statement);
        if injector.unsupported().is_some() {
            continue;
        }
        for binding in injector.into_bindings() {
            if !bindings.contains(&binding) {
                bindings.push(binding);
            }
        }
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_instrumenter_returns_input() {
        let config = LineageConfig {
            enabled: false,
            ..Default::default()
        };
        let instrumented = Instrumenter::new(&config).instrument("select 1");
        assert_eq!(
            instrumented,
            Instrumented::Disabled {
                sql: "select 1".to_owned()
            }
        );
        assert!(!instrumented.is_instrumented());
    }

    #[test]
    fn unknown_dialect_passes_through() {
        assert_eq!(patch_compiled_sql("select 1", "oracle"), "select 1");
    }

    #[test]
    fn parallel_output_keeps_input_order() {
        let sqls = (0..20)
            .map(|i| format!("SELECT {} AS x FROM t{}", i, i))
            .collect::<Vec<_>>();
        let refs = sqls.iter().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(
            instrument_many(&refs, "duckdb", true),
            instrument_many(&refs, "duckdb", false)
        );
    }

    #[test]
    fn bindings_skip_ctes() {
        let sql = "WITH c AS (SELECT * FROM raw.orders o) SELECT * FROM c JOIN customers ON c.id = customers.id";
        let bindings = source_bindings(sql, "postgres").unwrap();
        assert_eq!(
            bindings,
            vec![
                SourceBinding {
                    alias: "o".to_owned(),
                    relation: vec!["raw".to_owned(), "orders".to_owned()],
                },
                SourceBinding {
                    alias: "customers".to_owned(),
                    relation: vec!["customers".to_owned()],
                },
            ]
        );
    }

    #[test]
    fn bindings_skip_statements_kept_as_is() {
        let sql = "SELECT DISTINCT * FROM raw.orders; SELECT id FROM raw.customers";
        let bindings = source_bindings(sql, "duckdb").unwrap();
        assert_eq!(
            bindings,
            vec![SourceBinding {
                alias: "customers".to_owned(),
                relation: vec!["raw".to_owned(), "customers".to_owned()],
            }]
        );
    }

    #[test]
    fn row_comparing_set_operations_are_kept_as_is() {
        for sql in [
            "select id from a intersect select id from b",
            "select id from a except all select id from b",
            "with c as (select id from a except select id from b) select id from c",
        ] {
            let (rewritten, outcomes) = rewrite(sql, Dialect::DuckDb);
            assert_eq!(rewritten, sql);
            let [StatementOutcome::Passthrough { reason }] = outcomes.as_slice() else {
                panic!("`{}` should pass through, got {:?}", sql, outcomes);
            };
            assert!(reason.contains("INTERSECT and EXCEPT"), "{}", reason);
        }
    }
}
