//! `SearchEngine`: orchestrates filter → vector search → traversal → rerank.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Instant;

use tracing::{debug, instrument};

use super::filter;
use super::traverser::RelationTraverser;
use crate::cancel::CancellationToken;
use crate::entry::KnowledgeEntry;
use crate::error::{LatticeError, Result};
use crate::store::DocumentStore;
use crate::types::{EntryId, Metadata};
use crate::vector::{cosine_distance, VectorIndex};

/// A similarity search request.
#[derive(Clone, Debug)]
pub struct SearchRequest {
    /// Query embedding, dimension `D`.
    pub query: Vec<f32>,
    /// Number of results to return. Default 10.
    pub k: usize,
    /// BFS depth into the relation graph. 0 disables traversal. Default 0.
    pub traversal_depth: usize,
    /// Metadata equality filters. `None` is a no-op.
    pub filters: Option<Metadata>,
    /// Exact tag match list. `None`/empty is a no-op unless `tag_prefixes` is set.
    pub tags: Option<Vec<String>>,
    /// Hierarchical tag-prefix match list. `None`/empty is a no-op unless `tags` is set.
    pub tag_prefixes: Option<Vec<String>>,
    /// Forces brute-force cosine search and near-duplicate-only filtering
    /// (similarity ≥ 0.999). Default false.
    pub use_exact: bool,
    /// HNSW candidate-list size override. `None` uses the store's configured default.
    pub ef_search: Option<usize>,
    /// Cap on total entries `RelationTraverser` may return. Default 1000.
    pub max_traversal_results: usize,
    /// Cap on BFS depth within `RelationTraverser`. Default 5.
    pub max_depth: usize,
}

impl SearchRequest {
    /// Creates a request with sensible defaults for everything but `query`.
    pub fn new(query: Vec<f32>) -> Self {
        Self {
            query,
            k: 10,
            traversal_depth: 0,
            filters: None,
            tags: None,
            tag_prefixes: None,
            use_exact: false,
            ef_search: Some(400),
            max_traversal_results: 1000,
            max_depth: 5,
        }
    }
}

/// A single search hit.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub entry: KnowledgeEntry,
    pub similarity: f32,
    /// 0 for direct vector-search hits; ≥ 1 for traversal-expanded hits.
    pub traversal_depth: usize,
    /// The entry this result was reached from during traversal. `None` for
    /// direct hits.
    pub source_entry_id: Option<EntryId>,
    /// The full path from a seed entry to this one, inclusive of both ends.
    pub relation_path: Vec<EntryId>,
}

/// Threshold below which vector search always falls back to brute force
/// cosine scoring — the HNSW graph isn't worth the overhead at this scale,
/// and staying exact avoids any approximation error on small stores.
const BRUTE_FORCE_THRESHOLD: usize = 1000;

/// Near-duplicate cutoff applied when `use_exact` is set. This makes
/// `use_exact` a near-duplicate finder rather than a plain
/// skip-the-approximate-index switch — surprising, but intentional.
const EXACT_SIMILARITY_CUTOFF: f32 = 0.999;

fn cancelled(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(CancellationToken::is_cancelled)
}

/// Runs the four-stage search pipeline and tracks per-engine usage counters.
///
/// Counters are only advanced for searches that complete without
/// cancellation.
#[derive(Debug, Default)]
pub struct SearchEngine {
    default_ef_search: usize,
    total_searches: AtomicU64,
    total_search_time_ms: AtomicU64,
}

impl SearchEngine {
    /// Creates a new engine. `default_ef_search` is used whenever a request
    /// doesn't override `ef_search`.
    pub fn new(default_ef_search: usize) -> Self {
        Self {
            default_ef_search,
            total_searches: AtomicU64::new(0),
            total_search_time_ms: AtomicU64::new(0),
        }
    }

    pub fn total_searches(&self) -> u64 {
        self.total_searches.load(AtomicOrdering::Relaxed)
    }

    pub fn total_search_time_ms(&self) -> u64 {
        self.total_search_time_ms.load(AtomicOrdering::Relaxed)
    }

    /// Mean wall-clock time per completed search, in milliseconds. `0.0`
    /// if no search has completed yet.
    pub fn average_search_time_ms(&self) -> f64 {
        let count = self.total_searches();
        if count == 0 {
            0.0
        } else {
            self.total_search_time_ms() as f64 / count as f64
        }
    }

    /// Runs the pipeline: normalize → filter → vector search → traversal →
    /// rerank. `cancel`, if given, is checked between each step; a
    /// cancelled search returns an empty result and does not advance the
    /// usage counters.
    #[instrument(skip(self, request, store, index, cancel), fields(k = request.k, depth = request.traversal_depth))]
    pub fn search(
        &self,
        request: &SearchRequest,
        store: &dyn DocumentStore,
        index: &dyn VectorIndex,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<SearchResult>> {
        if request.query.is_empty() {
            return Err(LatticeError::invalid_argument("query vector must not be empty"));
        }
        let start = Instant::now();

        let mut query = request.query.clone();
        let norm: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in query.iter_mut() {
                *x /= norm;
            }
        }

        if cancelled(cancel) {
            return Ok(Vec::new());
        }
        let scanned = store.scan_all()?;
        let candidates = filter::apply(&scanned, request);

        if cancelled(cancel) {
            return Ok(Vec::new());
        }
        let k_prime = request.k * (request.traversal_depth + 1);
        let use_brute_force =
            request.use_exact || candidates.len() < BRUTE_FORCE_THRESHOLD || index.count() < BRUTE_FORCE_THRESHOLD;

        let mut top = if use_brute_force {
            self.brute_force(&query, &candidates, k_prime, request.use_exact)
        } else {
            self.hnsw_search(&query, &candidates, index, k_prime, request.ef_search.unwrap_or(self.default_ef_search))?
        };

        if cancelled(cancel) {
            return Ok(Vec::new());
        }
        if request.traversal_depth > 0 {
            top = RelationTraverser::traverse(top, &query, store, request.max_depth, request.max_traversal_results);
        }

        if cancelled(cancel) {
            return Ok(Vec::new());
        }
        top.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        top.truncate(request.k);

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.total_searches.fetch_add(1, AtomicOrdering::Relaxed);
        self.total_search_time_ms.fetch_add(elapsed_ms.round() as u64, AtomicOrdering::Relaxed);
        debug!(results = top.len(), elapsed_ms, "search completed");

        Ok(top)
    }

    fn brute_force(
        &self,
        query: &[f32],
        candidates: &[&KnowledgeEntry],
        k_prime: usize,
        use_exact: bool,
    ) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = candidates
            .iter()
            .filter_map(|e| {
                e.embedding.as_ref().map(|emb| {
                    let similarity = 1.0 - cosine_distance(query, emb);
                    SearchResult {
                        entry: (*e).clone(),
                        similarity,
                        traversal_depth: 0,
                        source_entry_id: None,
                        relation_path: vec![e.id],
                    }
                })
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        scored.truncate(k_prime);
        if use_exact {
            scored.retain(|r| r.similarity >= EXACT_SIMILARITY_CUTOFF);
        }
        scored
    }

    fn hnsw_search(
        &self,
        query: &[f32],
        candidates: &[&KnowledgeEntry],
        index: &dyn VectorIndex,
        k_prime: usize,
        ef_search: usize,
    ) -> Result<Vec<SearchResult>> {
        let hits = index.query(query, k_prime, ef_search)?;
        let candidate_ids: HashSet<EntryId> = candidates.iter().map(|e| e.id).collect();
        let by_id: HashMap<EntryId, &KnowledgeEntry> = candidates.iter().map(|e| (e.id, *e)).collect();

        let mut scored: Vec<SearchResult> = hits
            .into_iter()
            .filter(|(id, _)| candidate_ids.contains(id))
            .filter_map(|(id, distance)| {
                by_id.get(&id).map(|e| SearchResult {
                    entry: (*e).clone(),
                    similarity: 1.0 - distance,
                    traversal_depth: 0,
                    source_entry_id: None,
                    relation_path: vec![id],
                })
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        Ok(scored)
    }
}
