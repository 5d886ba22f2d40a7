use std::path::PathBuf;

use thiserror::Error;

/// Failures a caller may want to tell apart.
///
/// They travel inside `anyhow::Error` and are recovered with `downcast_ref`.
#[derive(Debug, Error)]
pub enum LineageError {
    #[error("unsupported SQL dialect `{0}`")]
    UnsupportedDialect(String),

    #[error("cannot parse statement `{statement}`: {message}")]
    Parse { statement: String, message: String },

    #[error("cannot instrument statement `{statement}`: {message}")]
    Unsupported { statement: String, message: String },

    #[error("unsupported export format `{0}` (supported: jsonl)")]
    UnsupportedExportFormat(String),

    #[error("unsupported lineage mode `{0}` (supported: tokens, positional)")]
    UnsupportedLineageMode(String),

    #[error("invalid value for `{key}`: {message}")]
    InvalidConfigValue { key: String, message: String },

    #[error("node `{unique_id}` has no schema or relation name")]
    MissingRelation { unique_id: String },

    #[error("manifest not found at {}", .0.display())]
    ManifestNotFound(PathBuf),
}
