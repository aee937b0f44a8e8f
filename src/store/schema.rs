//! redb table layout and database-level metadata.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ METADATA_TABLE                                 │
//! │   Key: &str            "db_metadata"           │
//! │   Value: bincode(DatabaseMetadata)              │
//! ├───────────────────────────────────────────────┤
//! │ ENTRIES_TABLE                                  │
//! │   Key: &[u8; 16]       EntryId as UUID bytes   │
//! │   Value: bincode(KnowledgeEntry)                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Embeddings are kept inline in `ENTRIES_TABLE` rather than in a separate
//! table: every scan this store serves (`Filter`'s full scan, `rebuild_index`)
//! needs the embedding anyway, so splitting them out would add a join with
//! no corresponding read-path win.

use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Current schema version. Bump when the on-disk entry format changes.
pub const SCHEMA_VERSION: u32 = 1;

pub const METADATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");
pub const ENTRIES_TABLE: TableDefinition<&[u8; 16], &[u8]> = TableDefinition::new("entries");

const METADATA_KEY: &str = "db_metadata";

/// Database-level metadata, stored once under [`METADATA_KEY`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub schema_version: u32,
    /// Fixed embedding dimension `D` this store was created with.
    pub dimension: usize,
    pub created_at: Timestamp,
    pub last_opened_at: Timestamp,
}

impl DatabaseMetadata {
    pub fn new(dimension: usize) -> Self {
        let now = Timestamp::now();
        Self {
            schema_version: SCHEMA_VERSION,
            dimension,
            created_at: now,
            last_opened_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_opened_at = Timestamp::now();
    }

    pub fn is_compatible(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }

    pub(crate) fn key() -> &'static str {
        METADATA_KEY
    }
}
