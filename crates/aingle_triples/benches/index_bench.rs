//! Benchmarks for aingle_triples
//!
//! Run with: cargo bench -p aingle_triples

use aingle_triples::{GraphName, NodeId, Predicate, Triple, TripleIndex, TriplePattern, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn populated(size: usize) -> TripleIndex {
    (0..size)
        .map(|i| {
            Triple::new(
                NodeId::named(format!("user:{}", i % 10)),
                Predicate::named(format!("prop:{}", i % 5)),
                Value::integer(i as i64),
            )
            .in_graph(GraphName::named(format!("graph:{}", i % 3)))
        })
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("memory", size), size, |b, &size| {
            b.iter(|| {
                let mut index = TripleIndex::new();
                for i in 0..size {
                    let triple = Triple::new(
                        NodeId::named(format!("node:{}", i)),
                        Predicate::named("index"),
                        Value::integer(i as i64),
                    );
                    index.insert(black_box(triple));
                }
            });
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let index = populated(1000);
    let mut group = c.benchmark_group("query");

    let by_subject = TriplePattern::subject(NodeId::named("user:5"));
    group.bench_function("spoc_range", |b| {
        b.iter(|| index.query(black_box(&by_subject)));
    });

    let by_graph = TriplePattern::context(GraphName::named("graph:1"))
        .with_subject(NodeId::named("user:4"));
    group.bench_function("cspo_range", |b| {
        b.iter(|| index.query(black_box(&by_graph)));
    });

    let by_predicate = TriplePattern::predicate(Predicate::named("prop:2"));
    group.bench_function("scan", |b| {
        b.iter(|| index.query(black_box(&by_predicate)));
    });

    group.finish();
}

fn bench_triple_id(c: &mut Criterion) {
    let triple = Triple::new(
        NodeId::named("test:subject"),
        Predicate::named("test:predicate"),
        Value::literal("test value"),
    );

    c.bench_function("triple_id_generation", |b| {
        b.iter(|| black_box(&triple).id());
    });
}

criterion_group!(benches, bench_insert, bench_query, bench_triple_id);
criterion_main!(benches);
