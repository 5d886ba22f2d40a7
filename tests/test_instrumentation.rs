use rowlineage::{
    config::LineageConfig,
    dialect::Dialect,
    instrument::{Instrumented, Instrumenter, StatementOutcome, patch_compiled_sql},
    parser::parse_sql_statements,
    resolver::TokenResolver,
    test_utils::{INSTRUMENTATION_TESTS_FILE, TestInstrumentationData, TestOutcome},
    vocabulary::{PARENT_TRACE_COLUMN, TRACE_COLUMN},
};

fn instrumenter(dialect: &str) -> Instrumenter {
    Instrumenter::new(&LineageConfig {
        dialect: Dialect::parse(dialect).unwrap(),
        ..Default::default()
    })
}

fn outcome_kind(outcome: &StatementOutcome) -> TestOutcome {
    match outcome {
        StatementOutcome::Instrumented => TestOutcome::Instrumented,
        StatementOutcome::Unchanged => TestOutcome::Unchanged,
        StatementOutcome::Passthrough { .. } => TestOutcome::Passthrough,
    }
}

#[test]
fn test_instrumentation() {
    let test_file = std::fs::read_to_string(INSTRUMENTATION_TESTS_FILE)
        .expect("Cannot open instrumentation test cases");
    let test_data: TestInstrumentationData =
        toml::from_str(&test_file).expect("Cannot parse test cases defined in toml");

    for test in test_data.tests {
        println!("Testing instrumentation: {}", test.name);
        let instrumenter = instrumenter(&test.dialect);
        let instrumented = instrumenter.instrument(&test.sql);
        let Instrumented::Rewritten { sql, statements } = &instrumented else {
            panic!("instrumentation should be enabled");
        };

        let outcomes = statements.iter().map(outcome_kind).collect::<Vec<_>>();
        assert_eq!(outcomes, test.outcomes, "outcomes of `{}`", test.name);

        match &test.expected {
            Some(expected) => assert_eq!(sql, expected, "rewrite of `{}`", test.name),
            None => assert_eq!(sql, &test.sql, "`{}` should be left as is", test.name),
        }

        // Every rewritten statement parses again
        let dialect = Dialect::parse(&test.dialect).unwrap();
        if instrumented.is_instrumented() {
            for parsed in parse_sql_statements(sql, dialect).unwrap() {
                if outcomes.contains(&TestOutcome::Passthrough) && parsed.statement.is_err() {
                    continue;
                }
                assert!(parsed.statement.is_ok(), "cannot parse {}", parsed.sql);
            }
        }

        // Instrumenting twice changes nothing
        let again = instrumenter.instrument(sql);
        assert_eq!(again.sql(), sql, "second pass over `{}`", test.name);
        assert!(!again.is_instrumented());
    }
}

#[test]
fn test_reserved_columns_come_first() {
    let sqls = [
        "select a, b from t",
        "select count(*) as n from t",
        "select x.* from (select 1 as a) x",
    ];
    for sql in sqls {
        let instrumented = patch_compiled_sql(sql, "duckdb");
        let first = instrumented.split(", ").next().unwrap();
        assert_eq!(first, format!("SELECT UUID() AS {}", TRACE_COLUMN));
        assert!(instrumented.contains(&format!(") AS {}, ", PARENT_TRACE_COLUMN)));
        let trace_at = instrumented.find(TRACE_COLUMN).unwrap();
        let tokens_at = instrumented.find(PARENT_TRACE_COLUMN).unwrap();
        assert!(trace_at < tokens_at);
    }
}

#[test]
fn test_self_join_keeps_both_aliases() {
    let sql = "select a.id from orders a join orders b on a.parent_id = b.id";
    let instrumented = patch_compiled_sql(sql, "duckdb");
    assert!(instrumented.contains("['a:' || CAST(a._row_trace_id AS TEXT)]"));
    assert!(instrumented.contains("['b:' || CAST(b._row_trace_id AS TEXT)]"));
    assert!(instrumented.starts_with("SELECT UUID() AS _row_trace_id, LIST_DISTINCT("));
}

#[test]
fn test_resolution_after_join() {
    // Tokens a row of `select a.id, b.val from t1 a join t2 b on a.id = b.id`
    // carries once executed.
    let tokens = ["a:u1", "b:u3"];
    let t1 = TokenResolver::new("t1").with_aliases(["a"]);
    let t2 = TokenResolver::new("t2").with_aliases(["b"]);
    assert_eq!(t1.resolve(&tokens).into_iter().collect::<Vec<_>>(), vec!["u1"]);
    assert_eq!(t2.resolve(&tokens).into_iter().collect::<Vec<_>>(), vec!["u3"]);
}

#[test]
fn test_unknown_dialect_is_a_passthrough() {
    let sql = "select id from orders";
    assert_eq!(patch_compiled_sql(sql, "teradata"), sql);
}

#[test]
fn test_scanner_failure_is_a_passthrough() {
    let sql = "select 'unterminated from orders";
    let instrumented = instrumenter("postgres").instrument(sql);
    assert_eq!(instrumented.sql(), sql);
    let Instrumented::Rewritten { statements, .. } = instrumented else {
        panic!("instrumentation should be enabled");
    };
    assert!(matches!(
        statements.as_slice(),
        [StatementOutcome::Passthrough { .. }]
    ));
}

#[test]
fn test_disabled_config() {
    let config = LineageConfig {
        enabled: false,
        ..Default::default()
    };
    let instrumented = Instrumenter::new(&config).instrument("select 1 as x");
    assert_eq!(instrumented.sql(), "select 1 as x");
    assert!(!instrumented.is_instrumented());
}
