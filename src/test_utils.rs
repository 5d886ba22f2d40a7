use std::fmt::Display;

use serde::Deserialize;

pub const PARSING_TESTS_FILE: &str = "tests/parsing_tests.toml";
pub const INSTRUMENTATION_TESTS_FILE: &str = "tests/instrumentation_tests.toml";

fn default_dialect() -> String {
    "postgres".to_owned()
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestParsing {
    pub sql: String,
    #[serde(default = "default_dialect")]
    pub dialect: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestParsingData {
    pub tests: Vec<TestParsing>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Instrumented,
    Unchanged,
    Passthrough,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestInstrumentation {
    pub name: String,
    pub sql: String,
    #[serde(default = "default_dialect")]
    pub dialect: String,
    /// Exact rewritten SQL, when the case pins it.
    pub expected: Option<String>,
    /// Outcome of each statement, in order.
    #[serde(default)]
    pub outcomes: Vec<TestOutcome>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestInstrumentationData {
    pub tests: Vec<TestInstrumentation>,
}

impl Display for TestInstrumentationData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
