//! Vector index abstraction for semantic search.
//!
//! A single implementation is provided: [`HnswIndex`], a from-scratch
//! hierarchical navigable small world graph. It is kept behind a trait so
//! [`crate::core::StoreCore`] doesn't depend on the graph internals
//! directly.
//!
//! Embeddings held by [`crate::store`] are the source of truth. The HNSW
//! graph is a derived, rebuildable structure: `StoreCore::open`
//! always rebuilds it from the document store's embeddings rather than
//! persisting the graph itself, since graph edges reference node positions
//! that aren't meaningfully serializable across a process boundary.

mod hnsw;

pub use hnsw::HnswIndex;

use crate::error::Result;
use crate::types::EntryId;

/// Cosine distance: `1 - cos(a, b)`, clamped to `[0, 2]`.
///
/// Either input being the zero vector makes cosine similarity undefined;
/// treated as maximal distance (1.0) rather than panicking, so a
/// zero-vector query still returns a well-ordered (if arbitrary) result.
/// Shared by [`HnswIndex`], brute-force search, and relation traversal so
/// all three agree on what "distance" means.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut norm_a = 0f32;
    let mut norm_b = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let cos = dot / (norm_a.sqrt() * norm_b.sqrt());
    1.0 - cos.clamp(-1.0, 1.0)
}

/// Vector index trait for approximate nearest neighbor search.
///
/// Implementations must be `Send + Sync`. Mutating methods take `&self`
/// and rely on interior mutability, since the index sits behind a single
/// lock that is held for the duration of `add`/`remove`/`query`/`rebuild`
/// rather than one lock per method call.
pub trait VectorIndex: Send + Sync {
    /// Inserts or updates the embedding mapped to `id`.
    ///
    /// If `id` is new, a node is appended to the graph. If `id` is already
    /// mapped, only the id→embedding mapping is updated; the previously
    /// linked graph node is left in place as unreachable history until the
    /// next [`rebuild`](VectorIndex::rebuild).
    fn add(&self, id: EntryId, embedding: &[f32]) -> Result<()>;

    /// Removes `id`'s mapping (soft delete/tombstone).
    ///
    /// The underlying graph node is not unlinked; it simply stops being a
    /// valid result because no live id maps to it.
    fn remove(&self, id: EntryId) -> Result<()>;

    /// Searches for the `k` nearest neighbors of `query`.
    ///
    /// Returns `(id, distance)` pairs sorted by ascending cosine distance,
    /// with ties broken by ascending insertion order. `ef_search` trades
    /// recall for latency; higher values search a wider candidate list.
    fn query(&self, query: &[f32], k: usize, ef_search: usize) -> Result<Vec<(EntryId, f32)>>;

    /// Rebuilds the graph from scratch using the current id→embedding
    /// mapping, in original insertion order. Drops all stale/unreachable
    /// nodes accumulated by repeated `add` calls on existing ids.
    fn rebuild(&self) -> Result<()>;

    /// Number of live (non-removed) id→embedding mappings.
    fn count(&self) -> usize;

    /// True if there are no live mappings.
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
