//! Candidate filtering.
//!
//! Applied to a full scan of non-deleted entries before any vector search
//! happens. Two independent predicates, both optional and both "no match
//! required" by default: metadata equality and tag/tag-prefix membership.

use super::engine::SearchRequest;
use crate::entry::KnowledgeEntry;

/// Returns `true` if `entry` passes every supplied metadata filter and at
/// least one tag/tag-prefix constraint (if any were supplied). Deleted
/// entries never match.
pub fn matches(entry: &KnowledgeEntry, request: &SearchRequest) -> bool {
    if entry.is_deleted {
        return false;
    }

    if let Some(filters) = &request.filters {
        for (key, expected) in filters {
            match entry.metadata.get(key) {
                Some(actual) if actual == expected => {}
                _ => return false,
            }
        }
    }

    let tags_empty = request.tags.as_ref().is_none_or(|t| t.is_empty());
    let prefixes_empty = request.tag_prefixes.as_ref().is_none_or(|p| p.is_empty());
    if tags_empty && prefixes_empty {
        return true;
    }

    let exact = request
        .tags
        .as_ref()
        .is_some_and(|wanted| entry.tags.iter().any(|t| wanted.contains(t)));
    let prefix = request.tag_prefixes.as_ref().is_some_and(|prefixes| {
        entry.tags.iter().any(|t| {
            prefixes
                .iter()
                .any(|p| t == p || t.starts_with(&format!("{p}/")))
        })
    });

    exact || prefix
}

/// Applies [`matches`] over a full candidate slice.
pub fn apply<'a>(candidates: &'a [KnowledgeEntry], request: &SearchRequest) -> Vec<&'a KnowledgeEntry> {
    candidates.iter().filter(|e| matches(e, request)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetadataValue;

    fn entry_with(tags: &[&str]) -> KnowledgeEntry {
        let mut e = KnowledgeEntry::new("body");
        e.tags = tags.iter().map(|t| t.to_string()).collect();
        e
    }

    fn base_request() -> SearchRequest {
        SearchRequest::new(vec![1.0, 0.0])
    }

    #[test]
    fn test_deleted_entries_never_match() {
        let mut e = entry_with(&[]);
        e.is_deleted = true;
        assert!(!matches(&e, &base_request()));
    }

    #[test]
    fn test_no_filters_matches_everything() {
        let e = entry_with(&[]);
        assert!(matches(&e, &base_request()));
    }

    #[test]
    fn test_metadata_equality_filter() {
        let mut e = entry_with(&[]);
        e.metadata.insert("category".into(), MetadataValue::from("AI"));
        let mut req = base_request();
        req.filters = Some([("category".to_string(), MetadataValue::from("AI"))].into());
        assert!(matches(&e, &req));

        req.filters = Some([("category".to_string(), MetadataValue::from("ML"))].into());
        assert!(!matches(&e, &req));
    }

    #[test]
    fn test_missing_metadata_key_excludes() {
        let e = entry_with(&[]);
        let mut req = base_request();
        req.filters = Some([("category".to_string(), MetadataValue::from("AI"))].into());
        assert!(!matches(&e, &req));
    }

    #[test]
    fn test_exact_tag_match() {
        let e = entry_with(&["AI/ML"]);
        let mut req = base_request();
        req.tags = Some(vec!["AI/ML".to_string()]);
        assert!(matches(&e, &req));
    }

    #[test]
    fn test_tag_prefix_matches_self_and_children_not_siblings() {
        let mut req = base_request();
        req.tag_prefixes = Some(vec!["AI/ML".to_string()]);

        assert!(matches(&entry_with(&["AI/ML"]), &req));
        assert!(matches(&entry_with(&["AI/ML/NeuralNetworks"]), &req));
        assert!(!matches(&entry_with(&["AI/MLops"]), &req));
        assert!(!matches(&entry_with(&["Programming/Python"]), &req));
    }

    #[test]
    fn test_tag_filter_is_noop_when_absent() {
        let e = entry_with(&["anything"]);
        assert!(matches(&e, &base_request()));
    }

    #[test]
    fn test_apply_filters_slice() {
        let entries = vec![entry_with(&["AI/ML"]), entry_with(&["Programming/Python"])];
        let mut req = base_request();
        req.tag_prefixes = Some(vec!["AI/ML".to_string()]);
        let result = apply(&entries, &req);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].tags, vec!["AI/ML".to_string()]);
    }
}
