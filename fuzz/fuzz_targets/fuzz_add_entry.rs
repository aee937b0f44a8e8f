#![no_main]

use arbitrary::Arbitrary;
use latticedb::{Config, KnowledgeEntry, MetadataValue, Relation, StoreCore};
use libfuzzer_sys::fuzz_target;

const DIM: usize = 8;

#[derive(Arbitrary, Debug)]
struct FuzzRelation {
    weight: f32,
    relation_type: Option<String>,
}

#[derive(Arbitrary, Debug)]
struct FuzzEntry {
    content: String,
    embedding: Option<Vec<f32>>,
    tags: Vec<String>,
    metadata: Vec<(String, i64)>,
    relations: Vec<FuzzRelation>,
}

fuzz_target!(|input: FuzzEntry| {
    let dir = tempfile::tempdir().unwrap();
    let config = Config { dimension: DIM, ..Config::default() };
    let store = StoreCore::open(dir.path().join("lattice.db"), None, config).unwrap();

    let mut entry = KnowledgeEntry::new(input.content);
    entry.embedding = input.embedding.map(|mut v| {
        v.truncate(DIM);
        v.resize(DIM, 0.0);
        v
    });
    entry.tags = input.tags;
    for (k, v) in input.metadata {
        entry.metadata.insert(k, MetadataValue::from(v));
    }
    for rel in input.relations {
        let mut r = Relation::new(latticedb::EntryId::new()).with_weight(rel.weight);
        if let Some(t) = rel.relation_type {
            r = r.with_type(t);
        }
        entry.relations.push(r);
    }

    // `add` must never panic: every input either validates successfully or
    // returns a `ValidationError`.
    let _ = store.add(entry);
});
