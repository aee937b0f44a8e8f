//! Integration tests for the full search pipeline: filters, tag prefixes,
//! exact match, and relation traversal.

use latticedb::{Config, KnowledgeEntry, MetadataValue, Relation, SearchRequest, StoreCore};
use tempfile::tempdir;

const DIM: usize = 4;

fn store() -> (StoreCore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let config = Config { dimension: DIM, ..Config::default() };
    (StoreCore::open(dir.path().join("lattice.db"), None, config).unwrap(), dir)
}

/// An entry's own embedding, queried exactly, is its own top-1 match.
#[test]
fn test_exact_self_match() {
    let (store, _dir) = store();
    let mut a = KnowledgeEntry::new("a");
    a.embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);
    let id = store.add(a.clone()).unwrap();

    let mut request = SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0]);
    request.k = 1;
    request.use_exact = true;
    let results = store.search(&request, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.id, id);
    assert!(results[0].similarity >= 0.999);
}

/// Metadata filter narrows to exactly the matching entry.
#[test]
fn test_metadata_filter_narrows_to_category() {
    let (store, _dir) = store();
    let mut a = KnowledgeEntry::new("a");
    a.embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);
    a.metadata.insert("category".into(), MetadataValue::from("AI"));
    let a_id = store.add(a).unwrap();

    let mut b = KnowledgeEntry::new("b");
    b.embedding = Some(vec![0.0, 1.0, 0.0, 0.0]);
    b.metadata.insert("category".into(), MetadataValue::from("ML"));
    store.add(b).unwrap();

    let mut request = SearchRequest::new(vec![0.7, 0.7, 0.0, 0.0]);
    request.k = 10;
    request.filters = Some([("category".to_string(), MetadataValue::from("AI"))].into());
    let results = store.search(&request, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.id, a_id);
}

/// Tag-prefix filtering matches the hierarchy, not siblings.
#[test]
fn test_tag_prefix_matches_hierarchy_not_siblings() {
    let (store, _dir) = store();
    let tags = ["AI/ML", "AI/ML/NN", "AI/ML/DL", "Programming/Python"];
    let mut ids = Vec::new();
    for (i, t) in tags.iter().enumerate() {
        let mut e = KnowledgeEntry::new(format!("e{i}"));
        e.embedding = Some(vec![1.0, i as f32, 0.0, 0.0]);
        e.tags.push(t.to_string());
        ids.push(store.add(e).unwrap());
    }

    let mut request = SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0]);
    request.k = 10;
    request.tag_prefixes = Some(vec!["AI/ML".to_string()]);
    let results = store.search(&request, None).unwrap();

    assert_eq!(results.len(), 3);
    let returned: std::collections::HashSet<_> = results.iter().map(|r| r.entry.id).collect();
    assert!(returned.contains(&ids[0]));
    assert!(returned.contains(&ids[1]));
    assert!(returned.contains(&ids[2]));
    assert!(!returned.contains(&ids[3]));
}

#[test]
fn test_tag_prefix_excludes_non_path_sibling() {
    let (store, _dir) = store();
    let mut ml = KnowledgeEntry::new("ml");
    ml.embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);
    ml.tags.push("AI/ML".to_string());
    let ml_id = store.add(ml).unwrap();

    let mut mlops = KnowledgeEntry::new("mlops");
    mlops.embedding = Some(vec![0.9, 0.1, 0.0, 0.0]);
    mlops.tags.push("AI/MLops".to_string());
    store.add(mlops).unwrap();

    let mut request = SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0]);
    request.k = 10;
    request.tag_prefixes = Some(vec!["AI/ML".to_string()]);
    let results = store.search(&request, None).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.id, ml_id);
}

/// Chained relations, traversal depth, and decay.
#[test]
fn test_traversal_chain_depth_and_decay() {
    let (store, _dir) = store();
    let root_embedding = vec![1.0, 0.0, 0.0, 0.0];

    let mut root = KnowledgeEntry::new("root");
    root.embedding = Some(root_embedding.clone());
    let root_id = store.add(root).unwrap();

    let mut prev_id = root_id;
    let mut chain_ids = vec![root_id];
    for i in 1..=3 {
        let mut node = KnowledgeEntry::new(format!("L{i}"));
        node.embedding = Some(root_embedding.clone());
        node.relations.push(Relation::new(prev_id).with_weight(1.0));
        let id = store.add(node).unwrap();
        chain_ids.push(id);
        prev_id = id;
    }

    let mut request = SearchRequest::new(root_embedding);
    request.k = 10;
    request.traversal_depth = 4;
    request.use_exact = true;
    request.max_traversal_results = 50;
    let results = store.search(&request, None).unwrap();

    let root_result = results.iter().find(|r| r.entry.id == root_id).unwrap();
    assert_eq!(root_result.traversal_depth, 0);
    assert!(root_result.similarity >= 0.999);

    let l1_id = chain_ids[1];
    let l1_result = results.iter().find(|r| r.entry.id == l1_id);
    assert!(l1_result.is_some());
    let l1_result = l1_result.unwrap();
    assert!(l1_result.similarity < root_result.similarity);
    assert!(l1_result.similarity >= 0.0);
}

/// Decay monotonicity bound: a traversed result never exceeds
/// `base_similarity * 0.95^depth * max_weight`.
#[test]
fn test_decay_monotonicity_bound() {
    let (store, _dir) = store();
    let embedding = vec![1.0, 0.0, 0.0, 0.0];

    let mut root = KnowledgeEntry::new("root");
    root.embedding = Some(embedding.clone());
    let root_id = store.add(root).unwrap();

    let mut child = KnowledgeEntry::new("child");
    child.embedding = Some(embedding.clone());
    child.relations.push(Relation::new(root_id).with_weight(2.0));
    store.add(child).unwrap();

    let mut request = SearchRequest::new(embedding);
    request.k = 10;
    request.traversal_depth = 1;
    request.use_exact = true;
    let results = store.search(&request, None).unwrap();

    let child_result = results.iter().find(|r| r.traversal_depth == 1).unwrap();
    // bound: similarity <= base_similarity * 0.95^depth * max_weight
    assert!(child_result.similarity <= 1.0 * 0.95 * 2.0 + 1e-6);
}

/// Invalid-argument error path: an empty query vector is rejected.
#[test]
fn test_empty_query_vector_is_invalid_argument() {
    let (store, _dir) = store();
    let request = SearchRequest::new(vec![]);
    let err = store.search(&request, None).unwrap_err();
    assert!(err.is_validation());
}

/// Filter soundness: every result satisfies the metadata filter and at
/// least one tag constraint when supplied.
#[test]
fn test_filter_soundness_across_combined_predicates() {
    let (store, _dir) = store();
    let mut a = KnowledgeEntry::new("a");
    a.embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);
    a.metadata.insert("category".into(), MetadataValue::from("AI"));
    a.tags.push("AI/ML".to_string());
    store.add(a.clone()).unwrap();

    let mut b = KnowledgeEntry::new("b");
    b.embedding = Some(vec![0.9, 0.1, 0.0, 0.0]);
    b.metadata.insert("category".into(), MetadataValue::from("AI"));
    b.tags.push("Programming/Python".to_string());
    store.add(b).unwrap();

    let mut request = SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0]);
    request.k = 10;
    request.filters = Some([("category".to_string(), MetadataValue::from("AI"))].into());
    request.tag_prefixes = Some(vec!["AI/ML".to_string()]);
    let results = store.search(&request, None).unwrap();

    for r in &results {
        assert_eq!(r.entry.metadata.get("category"), Some(&MetadataValue::from("AI")));
        assert!(r.entry.tags.iter().any(|t| t == "AI/ML" || t.starts_with("AI/ML/")));
    }
}
