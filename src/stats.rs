//! Aggregate store statistics.

use std::collections::BTreeMap;

use crate::types::Timestamp;

/// Snapshot of a store's (or, after merging, a whole router's) usage and
/// size statistics.
///
/// `index_size` is always 0: a PCA dimensionality model built at
/// ≥10 entries would be a statistics-only artefact with no bearing on
/// ranking or recall; this implementation never instantiates one, so
/// there is no component count to report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorDbStats {
    /// Total entries, including soft-deleted ones.
    pub total_entries: u64,
    /// PCA component count; always 0 here, see above.
    pub index_size: u64,
    /// Live (non-tombstoned) vectors held by the HNSW index.
    pub hnsw_index_size: u64,
    /// Rough estimate of in-memory bytes (content + embeddings).
    pub memory_usage: u64,
    pub last_updated: Timestamp,
    pub last_index_rebuild: Option<Timestamp>,
    /// Milliseconds since the store was opened.
    pub uptime_ms: u64,
    pub total_searches: u64,
    pub average_search_time_ms: f64,
    /// Not measured online — computing this needs an offline recall@10
    /// methodology against a labeled dataset.
    pub average_recall: f64,
    pub database_size_bytes: u64,
    /// Number of `StoreCore` shards backing this snapshot. 1 for a
    /// standalone store, `shard_count` after a router merge.
    pub active_connections: u64,
    /// Count of entries whose `metadata["category"]` equals each key,
    /// stringified.
    pub metadata_category_counts: BTreeMap<String, u64>,
    /// Count of entries carrying each exact tag string.
    pub tag_distribution: BTreeMap<String, u64>,
}

impl VectorDbStats {
    /// Merges per-shard stats into a router-level snapshot: sums totals,
    /// maxes timestamps/uptime, length-weighted-averages search time,
    /// unions the category/tag maps.
    pub fn merge(shards: &[VectorDbStats]) -> VectorDbStats {
        let mut merged = VectorDbStats {
            active_connections: shards.len() as u64,
            ..Default::default()
        };
        if shards.is_empty() {
            return merged;
        }

        let mut weighted_time_sum = 0.0f64;
        let mut recall_sum = 0.0f64;
        let mut recall_count = 0u64;

        for s in shards {
            merged.total_entries += s.total_entries;
            merged.index_size += s.index_size;
            merged.hnsw_index_size += s.hnsw_index_size;
            merged.memory_usage += s.memory_usage;
            merged.database_size_bytes += s.database_size_bytes;
            merged.total_searches += s.total_searches;
            merged.uptime_ms = merged.uptime_ms.max(s.uptime_ms);
            merged.last_updated = merged.last_updated.max(s.last_updated);
            merged.last_index_rebuild = match (merged.last_index_rebuild, s.last_index_rebuild) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, None) => a,
                (None, b) => b,
            };
            weighted_time_sum += s.average_search_time_ms * s.total_searches as f64;
            if s.total_searches > 0 {
                recall_sum += s.average_recall;
                recall_count += 1;
            }
            for (k, v) in &s.metadata_category_counts {
                *merged.metadata_category_counts.entry(k.clone()).or_insert(0) += v;
            }
            for (k, v) in &s.tag_distribution {
                *merged.tag_distribution.entry(k.clone()).or_insert(0) += v;
            }
        }

        merged.average_search_time_ms = if merged.total_searches > 0 {
            weighted_time_sum / merged.total_searches as f64
        } else {
            0.0
        };
        merged.average_recall = if recall_count > 0 {
            recall_sum / recall_count as f64
        } else {
            0.0
        };

        merged
    }
}
