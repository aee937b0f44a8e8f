//! Document store abstraction.
//!
//! [`DocumentStore`] is the primary-key CRUD + full-scan contract a
//! [`crate::core::StoreCore`] needs from its persistence layer. Embeddings
//! are stored as part of the entry and are the source of truth the HNSW
//! graph is rebuilt from.

pub mod redb_store;
pub mod schema;

pub use redb_store::RedbDocumentStore;
pub use schema::{DatabaseMetadata, SCHEMA_VERSION};

use crate::entry::KnowledgeEntry;
use crate::error::Result;
use crate::types::EntryId;

/// Storage engine trait for the document store.
///
/// Implementations must be `Send + Sync`; internal synchronization is the
/// implementation's responsibility — concurrency is delegated to the
/// underlying store.
pub trait DocumentStore: Send + Sync {
    /// Fetches a single entry by id.
    fn get(&self, id: EntryId) -> Result<Option<KnowledgeEntry>>;

    /// Inserts or replaces the entry at `entry.id`.
    fn upsert(&self, entry: &KnowledgeEntry) -> Result<()>;

    /// Inserts or replaces a batch of entries in a single transaction.
    fn upsert_batch(&self, entries: &[KnowledgeEntry]) -> Result<()>;

    /// Hard-deletes an entry. Used by `purge_deleted`, never by
    /// `mark_for_deletion` (which only flips `is_deleted`).
    fn delete(&self, id: EntryId) -> Result<()>;

    /// Returns every entry in the store, deleted or not. Callers filter.
    fn scan_all(&self) -> Result<Vec<KnowledgeEntry>>;

    /// Total entry count, including soft-deleted entries.
    fn len(&self) -> Result<usize>;

    /// True if the store holds no entries at all.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
