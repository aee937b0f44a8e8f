//! `RelationTraverser`: breadth-first expansion over the relation graph.
//!
//! Decays similarity multiplicatively per hop so deeper results never
//! outrank shallower ones sharing the same embedding similarity, and skips
//! dangling relation targets silently rather than erroring (a dangling
//! target is never raised to the caller as an error).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use super::engine::SearchResult;
use crate::store::DocumentStore;
use crate::types::EntryId;
use crate::vector::cosine_distance;

/// Per-hop similarity decay factor.
pub const DECAY: f32 = 0.95;

/// Breadth-first expansion from `seeds`.
///
/// `query` is the (possibly normalized) original query vector. `max_depth`
/// caps how many hops are followed; `max_results` caps the total number of
/// entries in the returned set (seeds included). Output is sorted by
/// similarity descending.
pub struct RelationTraverser;

impl RelationTraverser {
    pub fn traverse(
        seeds: Vec<SearchResult>,
        query: &[f32],
        store: &dyn DocumentStore,
        max_depth: usize,
        max_results: usize,
    ) -> Vec<SearchResult> {
        let mut visited: HashSet<EntryId> = HashSet::new();
        let mut results: HashMap<EntryId, SearchResult> = HashMap::new();
        let mut queue: VecDeque<(EntryId, usize, Option<EntryId>, Vec<EntryId>)> = VecDeque::new();

        for seed in seeds {
            let id = seed.entry.id;
            visited.insert(id);
            queue.push_back((id, 0, None, vec![id]));
            results.insert(id, seed);
        }

        loop {
            if results.len() >= max_results {
                break;
            }
            let Some((cur_id, depth, src_id, path)) = queue.pop_front() else {
                break;
            };
            if depth >= max_depth {
                continue;
            }
            let Some(cur) = store.get(cur_id).ok().flatten() else {
                continue;
            };

            for rel in &cur.relations {
                let target = rel.target_id;
                if visited.contains(&target) {
                    continue;
                }
                visited.insert(target);

                let Some(tgt) = store.get(target).ok().flatten() else {
                    continue;
                };

                let similarity = match &tgt.embedding {
                    Some(emb) => {
                        let sim = (1.0 - cosine_distance(query, emb)) * DECAY.powi((depth + 1) as i32) * rel.weight;
                        sim.max(0.0)
                    }
                    None => 0.0,
                };

                let mut relation_path = path.clone();
                relation_path.push(target);

                results.insert(
                    target,
                    SearchResult {
                        entry: tgt,
                        similarity,
                        traversal_depth: depth + 1,
                        source_entry_id: Some(src_id.unwrap_or(cur_id)),
                        relation_path: relation_path.clone(),
                    },
                );
                queue.push_back((target, depth + 1, Some(cur_id), relation_path));
            }
        }

        let mut out: Vec<SearchResult> = results.into_values().collect();
        out.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        out
    }
}
