//! Property-based tests for filter soundness and decay monotonicity using
//! random tag/metadata/embedding combinations.

use latticedb::{Config, KnowledgeEntry, MetadataValue, Relation, SearchRequest, StoreCore};
use proptest::prelude::*;
use tempfile::tempdir;

const DIM: usize = 8;

fn normalized(v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.into_iter().map(|x| x / norm).collect()
    } else {
        v
    }
}

fn embedding_strategy() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0f32, DIM).prop_map(normalized)
}

fn tag_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("AI/ML".to_string()),
        Just("AI/ML/NeuralNetworks".to_string()),
        Just("AI/MLops".to_string()),
        Just("Programming/Python".to_string()),
    ]
}

proptest! {
    /// Every result satisfies the supplied metadata filter and at least
    /// one tag/tag-prefix constraint, whatever embeddings or tag
    /// assignments are drawn.
    #[test]
    fn test_filter_soundness(
        entries in prop::collection::vec((embedding_strategy(), tag_strategy(), 0..2i64), 1..15),
        query in embedding_strategy(),
    ) {
        let dir = tempdir().unwrap();
        let config = Config { dimension: DIM, ..Config::default() };
        let store = StoreCore::open(dir.path().join("lattice.db"), None, config).unwrap();

        for (i, (embedding, tag, category)) in entries.iter().enumerate() {
            let mut e = KnowledgeEntry::new(format!("e{i}"));
            e.embedding = Some(embedding.clone());
            e.tags.push(tag.clone());
            e.metadata.insert("category".into(), MetadataValue::from(*category));
            store.add(e).unwrap();
        }

        let mut request = SearchRequest::new(query);
        request.k = 20;
        request.filters = Some([("category".to_string(), MetadataValue::from(0i64))].into());
        request.tag_prefixes = Some(vec!["AI/ML".to_string()]);
        let results = store.search(&request, None).unwrap();

        for r in &results {
            prop_assert_eq!(r.entry.metadata.get("category"), Some(&MetadataValue::from(0i64)));
            prop_assert!(r.entry.tags.iter().any(|t| t == "AI/ML" || t.starts_with("AI/ML/")));
        }
    }

    /// A traversal result's similarity never exceeds
    /// `base_similarity * 0.95^depth * max_weight` for any single-hop
    /// chain with a random weight and embedding pair.
    #[test]
    fn test_decay_monotonicity(
        weight in 0.1f32..2.0f32,
        shared_embedding in embedding_strategy(),
    ) {
        let dir = tempdir().unwrap();
        let config = Config { dimension: DIM, ..Config::default() };
        let store = StoreCore::open(dir.path().join("lattice.db"), None, config).unwrap();

        let mut root = KnowledgeEntry::new("root");
        root.embedding = Some(shared_embedding.clone());
        let root_id = store.add(root).unwrap();

        let mut child = KnowledgeEntry::new("child");
        child.embedding = Some(shared_embedding.clone());
        child.relations.push(Relation::new(root_id).with_weight(weight));
        store.add(child).unwrap();

        let mut request = SearchRequest::new(shared_embedding);
        request.k = 10;
        request.traversal_depth = 1;
        request.use_exact = true;
        let results = store.search(&request, None).unwrap();

        let base = results.iter().find(|r| r.traversal_depth == 0).unwrap().similarity;
        if let Some(child_result) = results.iter().find(|r| r.traversal_depth == 1) {
            prop_assert!(child_result.similarity <= base * 0.95 * weight + 1e-5);
            prop_assert!(child_result.similarity >= 0.0);
        }
    }
}
