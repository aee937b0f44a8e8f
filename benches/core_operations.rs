//! Benchmarks for single-entry `add` and `search` throughput.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use latticedb::{Config, KnowledgeEntry, SearchRequest, StoreCore};
use tempfile::tempdir;

const DIM: usize = 64;

fn seeded_store(n: usize) -> (StoreCore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let config = Config { dimension: DIM, ..Config::default() };
    let store = StoreCore::open(dir.path().join("lattice.db"), None, config).unwrap();
    for i in 0..n {
        let mut e = KnowledgeEntry::new(format!("e{i}"));
        e.embedding = Some((0..DIM).map(|d| ((i * 31 + d) % 97) as f32 * 0.01).collect());
        store.add(e).unwrap();
    }
    (store, dir)
}

fn bench_add(c: &mut Criterion) {
    let (store, _dir) = seeded_store(10_000);
    let mut i = 10_000usize;
    c.bench_function("add_entry_with_embedding", |b| {
        b.iter(|| {
            let mut e = KnowledgeEntry::new(format!("e{i}"));
            e.embedding = Some((0..DIM).map(|d| ((i * 31 + d) % 97) as f32 * 0.01).collect());
            store.add(e).unwrap();
            i += 1;
        });
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_top10");
    for &n in &[1_000usize, 10_000, 100_000] {
        let (store, _dir) = seeded_store(n);
        let query: Vec<f32> = (0..DIM).map(|d| (d % 97) as f32 * 0.01).collect();

        group.bench_with_input(BenchmarkId::new("hnsw", n), &n, |b, _| {
            b.iter(|| {
                let mut request = SearchRequest::new(query.clone());
                request.k = 10;
                store.search(&request, None).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_search);
criterion_main!(benches);
