#![no_main]

use arbitrary::Arbitrary;
use latticedb::{Config, KnowledgeEntry, SearchRequest, StoreCore};
use libfuzzer_sys::fuzz_target;

const DIM: usize = 8;

#[derive(Arbitrary, Debug)]
struct FuzzRequest {
    seed_count: u8,
    query: Vec<f32>,
    k: usize,
    traversal_depth: u8,
    use_exact: bool,
    tags: Vec<String>,
}

fuzz_target!(|input: FuzzRequest| {
    let dir = tempfile::tempdir().unwrap();
    let config = Config { dimension: DIM, ..Config::default() };
    let store = StoreCore::open(dir.path().join("lattice.db"), None, config).unwrap();

    for i in 0..input.seed_count.min(32) {
        let mut e = KnowledgeEntry::new(format!("e{i}"));
        e.embedding = Some(vec![i as f32; DIM]);
        e.tags = input.tags.clone();
        let _ = store.add(e);
    }

    let mut request = SearchRequest::new(input.query);
    request.k = input.k % 64;
    request.traversal_depth = (input.traversal_depth % 8) as usize;
    request.use_exact = input.use_exact;
    if !input.tags.is_empty() {
        request.tags = Some(input.tags);
    }

    // `search` must never panic, regardless of query dimension, k, or
    // filter combination — only ever return a typed error.
    let _ = store.search(&request, None);
});
