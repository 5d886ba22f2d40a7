//! Project-level switches for row lineage.
//!
//! Settings come from project variables (`rowlineage_*` keys), either passed
//! as a map or loaded from a `rowlineage.toml` file with the same keys.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::anyhow;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::dialect::Dialect;
use crate::error::LineageError;

pub const ENABLED_VAR: &str = "rowlineage_enabled";
pub const EXPORT_FORMAT_VAR: &str = "rowlineage_export_format";
pub const EXPORT_PATH_VAR: &str = "rowlineage_export_path";
pub const LINEAGE_MODE_VAR: &str = "rowlineage_lineage_mode";
pub const DIALECT_VAR: &str = "rowlineage_dialect";

/// Format of the exported mappings. Only JSON lines is written, there is no
/// parquet or table sink.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumString,
    Display,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jsonl,
}

impl ExportFormat {
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        ExportFormat::from_str(name.trim())
            .map_err(|_| LineageError::UnsupportedExportFormat(name.to_owned()).into())
    }

    /// File name the sink writes under the export directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Jsonl => "lineage.jsonl",
        }
    }
}

/// How target rows are matched to upstream rows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumString,
    Display,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LineageMode {
    /// Resolve the parent tokens carried by each target row.
    #[default]
    Tokens,
    /// Pair source and target rows by position.
    Positional,
}

impl LineageMode {
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        LineageMode::from_str(name.trim())
            .map_err(|_| LineageError::UnsupportedLineageMode(name.to_owned()).into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
    pub enabled: bool,
    pub export_format: ExportFormat,
    pub export_path: Option<PathBuf>,
    pub lineage_mode: LineageMode,
    pub dialect: Dialect,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            export_format: ExportFormat::default(),
            export_path: None,
            lineage_mode: LineageMode::default(),
            dialect: Dialect::default(),
        }
    }
}

impl LineageConfig {
    /// Builds a config from project variables. Missing keys keep their
    /// defaults and unknown keys are ignored.
    pub fn from_vars(vars: &IndexMap<String, Value>) -> anyhow::Result<Self> {
        let mut config = LineageConfig::default();
        for (key, value) in vars {
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                ENABLED_VAR => config.enabled = bool_var(key, value)?,
                EXPORT_FORMAT_VAR => config.export_format = ExportFormat::parse(&str_var(key, value)?)?,
                EXPORT_PATH_VAR => {
                    let path = str_var(key, value)?;
                    config.export_path = if path.is_empty() {
                        None
                    } else {
                        Some(PathBuf::from(path))
                    };
                }
                LINEAGE_MODE_VAR => config.lineage_mode = LineageMode::parse(&str_var(key, value)?)?,
                DIALECT_VAR => config.dialect = Dialect::parse(&str_var(key, value)?)?,
                _ => log::debug!("Ignoring project variable {}", key),
            }
        }
        Ok(config)
    }

    /// The project variables that reproduce this config.
    pub fn as_vars(&self) -> IndexMap<String, Value> {
        let mut vars = IndexMap::new();
        vars.insert(ENABLED_VAR.to_owned(), Value::Bool(self.enabled));
        vars.insert(
            EXPORT_FORMAT_VAR.to_owned(),
            Value::String(self.export_format.to_string()),
        );
        vars.insert(
            EXPORT_PATH_VAR.to_owned(),
            self.export_path
                .as_ref()
                .map_or(Value::Null, |path| Value::String(path.display().to_string())),
        );
        vars.insert(
            LINEAGE_MODE_VAR.to_owned(),
            Value::String(self.lineage_mode.to_string()),
        );
        vars.insert(DIALECT_VAR.to_owned(), Value::String(self.dialect.to_string()));
        vars
    }

    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        let table: toml::Table = toml::from_str(source)?;
        let vars = table
            .into_iter()
            .map(|(key, value)| Ok((key, serde_json::to_value(value)?)))
            .collect::<anyhow::Result<IndexMap<String, Value>>>()?;
        Self::from_vars(&vars)
    }

    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|err| anyhow!("Failed to read config file {}: {}", path.display(), err))?;
        Self::from_toml_str(&source).map_err(|err| {
            anyhow!(
                "Failed to load config file {} due to error: {}",
                path.display(),
                err
            )
        })
    }
}

// Variables passed on the command line arrive as strings.
fn bool_var(key: &str, value: &Value) -> anyhow::Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(invalid(key, format!("expected a boolean, got `{}`", s))),
        },
        other => Err(invalid(key, format!("expected a boolean, got {}", other))),
    }
}

fn str_var(key: &str, value: &Value) -> anyhow::Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(invalid(key, format!("expected a string, got {}", other))),
    }
}

fn invalid(key: &str, message: String) -> anyhow::Error {
    LineageError::InvalidConfigValue {
        key: key.to_owned(),
        message,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn defaults() {
        let config = LineageConfig::from_vars(&IndexMap::new()).unwrap();
        assert_eq!(config, LineageConfig::default());
        assert!(config.enabled);
        assert_eq!(config.export_format, ExportFormat::Jsonl);
        assert_eq!(config.export_path, None);
        assert_eq!(config.lineage_mode, LineageMode::Tokens);
        assert_eq!(config.dialect, Dialect::Postgres);
    }

    #[test]
    fn reads_project_variables() {
        let config = LineageConfig::from_vars(&vars(&[
            (ENABLED_VAR, json!("false")),
            (EXPORT_FORMAT_VAR, json!("JSONL")),
            (EXPORT_PATH_VAR, json!("out/lineage")),
            (LINEAGE_MODE_VAR, json!("positional")),
            (DIALECT_VAR, json!("Snowflake")),
            ("unrelated", json!(3)),
        ]))
        .unwrap();
        assert!(!config.enabled);
        assert_eq!(config.export_path, Some(PathBuf::from("out/lineage")));
        assert_eq!(config.lineage_mode, LineageMode::Positional);
        assert_eq!(config.dialect, Dialect::Snowflake);
    }

    #[test]
    fn as_vars_round_trips() {
        let config = LineageConfig {
            enabled: false,
            export_path: Some(PathBuf::from("/tmp/lineage")),
            lineage_mode: LineageMode::Positional,
            dialect: Dialect::DuckDb,
            ..Default::default()
        };
        let vars = config.as_vars();
        assert_eq!(
            vars.keys().collect::<Vec<_>>(),
            vec![
                ENABLED_VAR,
                EXPORT_FORMAT_VAR,
                EXPORT_PATH_VAR,
                LINEAGE_MODE_VAR,
                DIALECT_VAR
            ]
        );
        assert_eq!(LineageConfig::from_vars(&vars).unwrap(), config);
    }

    #[test]
    fn parquet_is_unsupported() {
        let err = LineageConfig::from_vars(&vars(&[(EXPORT_FORMAT_VAR, json!("parquet"))]))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LineageError>(),
            Some(LineageError::UnsupportedExportFormat(format)) if format == "parquet"
        ));
    }

    #[test]
    fn rejects_bad_values() {
        let err =
            LineageConfig::from_vars(&vars(&[(LINEAGE_MODE_VAR, json!("fuzzy"))])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LineageError>(),
            Some(LineageError::UnsupportedLineageMode(_))
        ));

        let err = LineageConfig::from_vars(&vars(&[(ENABLED_VAR, json!("maybe"))])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LineageError>(),
            Some(LineageError::InvalidConfigValue { key, .. }) if key == ENABLED_VAR
        ));
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rowlineage.toml");
        std::fs::write(
            &path,
            "rowlineage_enabled = true\nrowlineage_dialect = \"duckdb\"\nrowlineage_export_path = \"lineage\"\n",
        )
        .unwrap();
        let config = LineageConfig::from_toml_file(&path).unwrap();
        assert!(config.enabled);
        assert_eq!(config.dialect, Dialect::DuckDb);
        assert_eq!(config.export_path, Some(PathBuf::from("lineage")));
    }
}
