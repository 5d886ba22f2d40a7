//! # rowlineage
//!
//! Row-level data lineage for chains of SQL models.
//!
//! # Features
//!
//! - Rewrite compiled `SELECT` statements so every produced row carries a
//!   trace id (`_row_trace_id`) and the provenance tokens of the upstream
//!   rows it was built from (`_row_parent_trace_ids`).
//! - Postgres, Snowflake and DuckDB renderings of the generated expressions.
//! - Best-effort: statements that cannot be parsed are passed through as is.
//! - Resolve the tokens of materialized rows into source-to-target row
//!   mappings, per model dependency of a dbt manifest.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowlineage::{
//!     config::LineageConfig,
//!     instrument::Instrumenter,
//!     resolver::TokenResolver,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!
//!     let config = LineageConfig::default();
//!     let instrumented = Instrumenter::new(&config).instrument(
//!         "select region, count(*) as n from analytics.orders group by region",
//!     );
//!     println!("{}", instrumented.sql());
//!
//!     // After running it, each output row holds tokens such as:
//!     let tokens = ["orders:8c1e..", "orders:41f0.."];
//!     let upstream_ids = TokenResolver::new("orders").resolve(&tokens);
//!     println!("{:?}", upstream_ids);
//!     Ok(())
//! }
//! ```
pub mod ast;
pub mod config;
pub mod dialect;
pub mod emitter;
pub mod error;
pub mod instrument;
pub mod manifest;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod rows;
pub mod scanner;
pub mod sink;
#[doc(hidden)]
pub mod test_utils;
pub mod tracer;
pub mod vocabulary;
