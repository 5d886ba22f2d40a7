use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::error::LineageError;

/// SQL dialect of the compiled models.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumString,
    Display,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[strum(to_string = "postgres", serialize = "postgresql")]
    Postgres,
    Snowflake,
    #[strum(serialize = "duckdb")]
    DuckDb,
}

impl Dialect {
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        Dialect::from_str(name.trim())
            .map_err(|_| LineageError::UnsupportedDialect(name.to_owned()).into())
    }

    /// Whether `\` escapes the next character inside string literals.
    pub fn backslash_escapes(&self) -> bool {
        matches!(self, Dialect::Snowflake)
    }

    /// Whether `SELECT * EXCLUDE (..)` is available.
    pub fn supports_star_exclude(&self) -> bool {
        matches!(self, Dialect::Snowflake | Dialect::DuckDb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dialect_names_case_insensitively() {
        assert_eq!(Dialect::parse("postgres").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::parse("PostgreSQL").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::parse("SNOWFLAKE").unwrap(), Dialect::Snowflake);
        assert_eq!(Dialect::parse("duckdb").unwrap(), Dialect::DuckDb);
        assert_eq!(Dialect::DuckDb.to_string(), "duckdb");
    }

    #[test]
    fn rejects_unknown_dialect() {
        let err = Dialect::parse("oracle").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LineageError>(),
            Some(LineageError::UnsupportedDialect(name)) if name == "oracle"
        ));
    }
}
