//! Benchmarks showing how search and rebuild scale with corpus size and
//! shard count.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use latticedb::{Config, KnowledgeEntry, SearchRequest, ShardRouter};
use tempfile::tempdir;

const DIM: usize = 32;

fn bench_rebuild_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild_index");
    for &n in &[1_000usize, 10_000, 50_000] {
        let dir = tempdir().unwrap();
        let config = Config { dimension: DIM, ..Config::default() };
        let store = latticedb::StoreCore::open(dir.path().join("lattice.db"), None, config).unwrap();
        for i in 0..n {
            let mut e = KnowledgeEntry::new(format!("e{i}"));
            e.embedding = Some(vec![(i % 97) as f32; DIM]);
            store.add(e).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| store.rebuild_index().unwrap());
        });
    }
    group.finish();
}

fn bench_sharded_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("sharded_search_top10");
    for &shard_count in &[1usize, 4, 8] {
        let dir = tempdir().unwrap();
        let config = Config { dimension: DIM, ..Config::default() };
        let router = ShardRouter::open(shard_count, dir.path().join("lattice"), config).unwrap();
        for i in 0..20_000 {
            let mut e = KnowledgeEntry::new(format!("e{i}"));
            e.embedding = Some(vec![(i % 97) as f32; DIM]);
            router.add(e).unwrap();
        }
        let query = vec![3.0f32; DIM];

        group.bench_with_input(BenchmarkId::from_parameter(shard_count), &shard_count, |b, _| {
            b.iter(|| {
                let mut request = SearchRequest::new(query.clone());
                request.k = 10;
                router.search(&request, None).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rebuild_scaling, bench_sharded_search);
criterion_main!(benches);
