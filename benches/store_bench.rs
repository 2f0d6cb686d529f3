//! Benchmarks for Tabula table operations

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

use tabula::{Condition, Config, Direction, Engine, IndexAction, IndexKind, Operator, Query, Record, SyncStrategy};

fn open_engine(dir: &TempDir) -> Engine {
    let config = Config::builder()
        .path(dir.path().join("bench.tdb"))
        .sync_strategy(SyncStrategy::EveryNEntries { count: 10_000 })
        .build();
    Engine::open(config).unwrap()
}

fn seed(engine: &Engine, count: usize) {
    for i in 0..count {
        let record = Record::new()
            .with("name", format!("user{:05}", i))
            .with("age", format!("{}", i % 90));
        engine.put(format!("pk{:05}", i).as_bytes(), record).unwrap();
    }
}

fn store_benchmarks(c: &mut Criterion) {
    c.bench_function("put_single", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        let mut i = 0u64;
        b.iter(|| {
            let record = Record::new().with("name", "bench").with("age", "42");
            engine.put(format!("pk{}", i).as_bytes(), record).unwrap();
            i += 1;
        });
    });

    c.bench_function("get_single", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        seed(&engine, 10_000);
        b.iter(|| engine.get(b"pk05000"));
    });

    c.bench_function("query_scan_numeric", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        seed(&engine, 10_000);
        let query = Query::new()
            .condition(Condition::new("age", Operator::NumGt, "80").unwrap())
            .order_by("age", Direction::NumericDesc)
            .limit(10);
        b.iter_batched(
            || query.clone(),
            |q| engine.search(&q).unwrap().into_keys(),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("query_indexed_numeric", |b| {
        let dir = TempDir::new().unwrap();
        let engine = open_engine(&dir);
        seed(&engine, 10_000);
        engine
            .set_index(b"age", IndexKind::Decimal, IndexAction::Add)
            .unwrap();
        let query = Query::new()
            .condition(Condition::new("age", Operator::NumGt, "80").unwrap())
            .order_by("age", Direction::NumericDesc)
            .limit(10);
        b.iter_batched(
            || query.clone(),
            |q| engine.search(&q).unwrap().into_keys(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
