//! `ShardRouter`: hash-routes writes to one of `N` [`StoreCore`]s and fans
//! reads out to all of them.
//!
//! Each shard is a fully independent `StoreCore` with its own document
//! store file and HNSW graph; there is no cross-shard transaction or
//! graph edge. `ShardRouter` itself holds no mutable state beyond the
//! shard handles.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::core::StoreCore;
use crate::entry::KnowledgeEntry;
use crate::error::Result;
use crate::search::{SearchRequest, SearchResult};
use crate::stats::VectorDbStats;
use crate::types::EntryId;

/// FNV-1a 32-bit hash, used to route an [`EntryId`] to a shard.
///
/// Chosen over the default `std` hasher because `RandomState` is
/// seeded per-process: routing must be stable across runs so that
/// reopening a router always finds an id on the same shard it was
/// written to.
fn fnv1a_32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Routes an id to a shard index in `0..shard_count`.
pub fn shard_of(id: EntryId, shard_count: usize) -> usize {
    (fnv1a_32(id.to_string().as_bytes()) as usize) % shard_count
}

/// Owns `N` independent [`StoreCore`]s and routes operations across them.
#[derive(Debug)]
pub struct ShardRouter {
    shards: Vec<StoreCore>,
}

impl ShardRouter {
    /// Opens (or creates) `shard_count` shards at `"{base_path}_{i}.db"`
    /// for `i` in `0..shard_count`, all sharing `config`.
    #[instrument(skip(base_path, config), fields(shard_count))]
    pub fn open(shard_count: usize, base_path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let base_path = base_path.as_ref();
        let mut shards = Vec::with_capacity(shard_count);
        for i in 0..shard_count {
            let path = shard_path(base_path, i);
            shards.push(StoreCore::open(path, None, config.clone())?);
        }
        info!(shard_count, "shard router opened");
        Ok(Self { shards })
    }

    /// Number of shards this router owns.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Inserts or updates `entry`. A nil id is assigned before routing, so
    /// the same id is used both for the write and for all future lookups.
    pub fn add(&self, mut entry: KnowledgeEntry) -> Result<EntryId> {
        if entry.id.is_nil() {
            entry.id = EntryId::new();
        }
        let shard = &self.shards[shard_of(entry.id, self.shards.len())];
        shard.add(entry)
    }

    /// Adds each entry via [`add`](Self::add) in order.
    pub fn add_batch(&self, entries: Vec<KnowledgeEntry>) -> Result<Vec<EntryId>> {
        entries.into_iter().map(|e| self.add(e)).collect()
    }

    /// Routes to the id's shard. Idempotent, like the underlying
    /// `StoreCore::mark_for_deletion`.
    pub fn mark_for_deletion(&self, id: EntryId) -> Result<()> {
        self.shards[shard_of(id, self.shards.len())].mark_for_deletion(id)
    }

    /// Searches every shard in parallel with the same request, concatenates
    /// the results, reranks by similarity, and truncates to `request.k`.
    /// Traversal, if requested, stays local to each shard.
    #[instrument(skip(self, request, cancel), fields(k = request.k, shards = self.shards.len()))]
    pub fn search(&self, request: &SearchRequest, cancel: Option<&CancellationToken>) -> Result<Vec<SearchResult>> {
        let mut per_shard: Vec<Result<Vec<SearchResult>>> = Vec::with_capacity(self.shards.len());
        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .shards
                .iter()
                .map(|shard| scope.spawn(|| shard.search(request, cancel)))
                .collect();
            for h in handles {
                per_shard.push(h.join().expect("shard search panicked"));
            }
        });

        let mut merged = Vec::new();
        for result in per_shard {
            merged.extend(result?);
        }
        merged.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        merged.truncate(request.k);
        Ok(merged)
    }

    /// Rebuilds every shard's vector index.
    pub fn rebuild_index(&self) -> Result<()> {
        for shard in &self.shards {
            shard.rebuild_index()?;
        }
        Ok(())
    }

    /// Purges soft-deleted entries on every shard. Returns the total
    /// number purged.
    pub fn purge_deleted(&self) -> Result<u64> {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.purge_deleted()?;
        }
        Ok(total)
    }

    /// Aggregates per-shard stats into a router-level snapshot via
    /// [`VectorDbStats::merge`].
    pub fn get_stats(&self) -> Result<VectorDbStats> {
        let per_shard: Vec<VectorDbStats> = self.shards.iter().map(|s| s.get_stats()).collect::<Result<_>>()?;
        Ok(VectorDbStats::merge(&per_shard))
    }

    /// Direct access to a shard by index, for callers that need
    /// shard-local operations (e.g. JSON import/export per shard).
    pub fn shard(&self, index: usize) -> Option<&StoreCore> {
        self.shards.get(index)
    }
}

fn shard_path(base_path: &Path, index: usize) -> PathBuf {
    let base = base_path.to_string_lossy();
    PathBuf::from(format!("{base}_{index}.db"))
}
