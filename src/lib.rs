//! # LatticeDB
//!
//! Embedded vector knowledge store combining HNSW approximate nearest
//! neighbor search with a document store, hierarchical tags, arbitrary
//! key/value metadata, and a weighted bidirectional relation graph.
//!
//! A single query fuses four mechanisms: metadata equality filters, exact
//! or hierarchical tag filters, cosine-similarity k-NN over the HNSW
//! index, and breadth-first relation-graph traversal with decayed
//! similarity propagation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use latticedb::{StoreCore, Config, KnowledgeEntry, SearchRequest};
//!
//! let store = StoreCore::open("./lattice.db", None, Config::default())?;
//!
//! let mut entry = KnowledgeEntry::new("Always validate user input before processing");
//! entry.embedding = Some(query_embedding.clone());
//! entry.tags.push("AI/ML/Security".to_string());
//! let id = store.add(entry)?;
//!
//! let results = store.search(&SearchRequest::new(query_embedding), None)?;
//! ```
//!
//! ## Key Concepts
//!
//! ### `KnowledgeEntry`
//!
//! The unit of storage: opaque content, an optional embedding, arbitrary
//! metadata, hierarchical `/`-separated tags, and a set of directed
//! relations to other entries.
//!
//! ### `StoreCore` and `ShardRouter`
//!
//! A [`StoreCore`] is a single-shard facade over a document store, an HNSW
//! vector index, and a search engine. A [`ShardRouter`] owns several
//! `StoreCore`s and hash-routes writes to one shard while fanning reads
//! out to all of them.
//!
//! ### Relations
//!
//! Relations are directed, weighted edges between entries. Four relation
//! types have recognized inverses (`parent_of`/`child_of`,
//! `depends_on`/`depended_by`); every write maintains a reciprocal edge on
//! the target automatically.
//!
//! ## Thread Safety
//!
//! `StoreCore` and `ShardRouter` are `Send + Sync` and can be shared across
//! threads using `Arc`. Each shard is a multi-reader/single-writer
//! resource: writes serialize on a per-shard lock while reads run
//! concurrently with each other and with writers.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod cancel;
mod config;
mod core;
pub mod entry;
mod error;
mod relation;
mod router;
pub mod search;
mod stats;
pub mod store;
pub mod types;

/// Vector index module for HNSW-based approximate nearest neighbor search.
pub mod vector;

// ============================================================================
// Public API re-exports
// ============================================================================

// Core facades
pub use core::StoreCore;
pub use router::{shard_of, ShardRouter};

// Configuration
pub use config::{Config, HnswParams};

// Error handling
pub use error::{LatticeError, NotFoundError, Result, StoreError, ValidationError};

// Core types
pub use types::{Embedding, EntryId, Metadata, MetadataValue, Timestamp};

// Domain types
pub use entry::{KnowledgeEntry, Relation};
pub use relation::inverse_type;

// Search
pub use search::{RelationTraverser, SearchEngine, SearchRequest, SearchResult};

// Stats
pub use stats::VectorDbStats;

// Cancellation
pub use cancel::CancellationToken;

// Storage (for advanced users)
pub use store::{DatabaseMetadata, DocumentStore, RedbDocumentStore};

// Vector index (for advanced users)
pub use vector::{cosine_distance, HnswIndex, VectorIndex};

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common LatticeDB usage.
///
/// ```rust
/// use latticedb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::core::StoreCore;
    pub use crate::entry::{KnowledgeEntry, Relation};
    pub use crate::error::{LatticeError, Result};
    pub use crate::router::ShardRouter;
    pub use crate::search::{SearchRequest, SearchResult};
    pub use crate::types::EntryId;
}
