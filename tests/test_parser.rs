use rowlineage::{
    dialect::Dialect,
    emitter::emit_statements,
    parser::{parse_sql, parse_sql_statements},
    test_utils::{PARSING_TESTS_FILE, TestParsingData},
};

fn test_sql(sql: &str, dialect: &str) {
    let ast = parse_sql(sql, dialect);
    if let Err(err) = &ast {
        println!("{}", err)
    }
    assert!(ast.is_ok());
}

fn test_emit_fixpoint(sql: &str, dialect: &str) {
    let dialect = Dialect::parse(dialect).unwrap();
    let ast = parse_sql(sql, dialect.as_ref()).unwrap();
    let emitted = emit_statements(&ast.statements, dialect);
    let reparsed = parse_sql(&emitted, dialect.as_ref())
        .unwrap_or_else(|err| panic!("Could not parse emitted sql {} due to: {}", emitted, err));
    assert_eq!(emit_statements(&reparsed.statements, dialect), emitted);
}

#[test]
fn test_should_parse() {
    let parsing_test_file =
        std::fs::read_to_string(PARSING_TESTS_FILE).expect("Cannot open parsing test cases");
    let test_parsing_data: TestParsingData =
        toml::from_str(&parsing_test_file).expect("Cannot parse test cases defined in toml");

    for test in test_parsing_data.tests {
        let sql = &test.sql;
        println!("Testing parsing for SQL: {}", sql);
        test_sql(sql, &test.dialect);
        test_sql(&sql.to_uppercase(), &test.dialect);
        test_sql(&sql.to_lowercase(), &test.dialect);
        test_emit_fixpoint(sql, &test.dialect);
    }
}

#[test]
fn test_should_not_parse() {
    let sqls = [
        // Trailing comma before FROM
        "select a, from t",
        // Unbalanced parentheses
        "select (1 + 2 from t",
        // Missing join condition operand
        "select * from a join b on",
        // Lateral needs a subquery or a function
        "select * from a, lateral b",
        // Not a test for IS
        "select a is 3 from t",
    ];
    for sql in sqls {
        println!("Testing parsing error for SQL: {}", sql);
        assert!(parse_sql(sql, "postgres").is_err())
    }
}

#[test]
fn test_unknown_dialect() {
    assert!(parse_sql("select 1", "oracle").is_err());
}

#[test]
fn test_statements_fail_independently() {
    let parsed = parse_sql_statements(
        "select 1 as a; select a, from t; vacuum analyze orders",
        Dialect::Postgres,
    )
    .unwrap();
    assert_eq!(parsed.len(), 3);
    assert!(parsed[0].statement.is_ok());
    assert!(parsed[1].statement.is_err());
    assert_eq!(parsed[1].sql, "select a, from t");
    assert!(parsed[2].statement.is_ok());
    assert_eq!(parsed[2].sql, "vacuum analyze orders");
}

#[test]
fn test_scanner_errors_fail_the_whole_script() {
    assert!(parse_sql_statements("select 1 as a; select 'open", Dialect::Postgres).is_err());
}
