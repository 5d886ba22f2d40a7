use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rowlineage::{
    instrument::{instrument_many, patch_compiled_sql},
    test_utils::{INSTRUMENTATION_TESTS_FILE, TestInstrumentationData},
};

fn instrument_tests(cases: &[(String, String)]) {
    for (sql, dialect) in cases {
        let _ = patch_compiled_sql(sql, dialect);
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let instrumentation_test_file = std::fs::read_to_string(INSTRUMENTATION_TESTS_FILE)
        .expect("Cannot open instrumentation test cases");
    let test_instrumentation_data: TestInstrumentationData =
        toml::from_str(&instrumentation_test_file)
            .expect("Cannot parse test cases defined in toml");

    let cases = test_instrumentation_data
        .tests
        .iter()
        .map(|test| (test.sql.clone(), test.dialect.clone()))
        .collect::<Vec<_>>();

    c.bench_function("bench instrumentation tests", |b| {
        b.iter(|| instrument_tests(black_box(&cases)))
    });

    // A project of many models sharing a dialect
    let duckdb_sqls = cases
        .iter()
        .filter(|(_, dialect)| dialect == "duckdb")
        .map(|(sql, _)| sql.as_str())
        .cycle()
        .take(500)
        .collect::<Vec<_>>();

    c.bench_function("bench instrument many sequential", |b| {
        b.iter(|| instrument_many(black_box(&duckdb_sqls), "duckdb", false))
    });
    c.bench_function("bench instrument many parallel", |b| {
        b.iter(|| instrument_many(black_box(&duckdb_sqls), "duckdb", true))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(100);
    targets = criterion_benchmark
);
criterion_main!(benches);
