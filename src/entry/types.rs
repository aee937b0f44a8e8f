//! Data types for [`KnowledgeEntry`] and its relation edges.

use serde::{Deserialize, Serialize};

use crate::types::{Embedding, EntryId, Metadata, Timestamp};

/// The unit of storage in a LatticeDB store.
///
/// An entry holds opaque content, an optional embedding for vector search,
/// arbitrary key/value metadata, hierarchical tags, and a set of directed
/// relations to other entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// 128-bit opaque identifier, unique per shard, stable for the
    /// life of the entry.
    pub id: EntryId,

    /// Opaque payload. Not interpreted by the core.
    pub content: String,

    /// Fixed-length embedding of dimension `D`. Absent entries are never
    /// returned by vector search but still exist in the relation graph.
    ///
    /// Stored separately from the rest of the entry on disk (see
    /// [`crate::store`]); skipped here only at the serialization-format
    /// boundary where that separation matters, not in this in-memory type.
    pub embedding: Option<Embedding>,

    /// Mapping from string key to scalar value. Order is not significant.
    pub metadata: Metadata,

    /// Ordered sequence of `/`-separated hierarchical tag paths,
    /// e.g. `"AI/ML/NeuralNetworks"`.
    pub tags: Vec<String>,

    /// Directed edges to other entries within the same store.
    pub relations: Vec<Relation>,

    /// Creation timestamp. Preserved across updates.
    pub created_at: Timestamp,

    /// Last-modified timestamp. Advances on every `add` that touches
    /// an existing id.
    pub updated_at: Timestamp,

    /// Soft-delete flag.
    pub is_deleted: bool,

    /// Timestamp at which `is_deleted` was set, if it was.
    pub deleted_at: Option<Timestamp>,
}

impl KnowledgeEntry {
    /// Creates a new entry with a fresh id and both timestamps set to now.
    pub fn new(content: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: EntryId::new(),
            content: content.into(),
            embedding: None,
            metadata: Metadata::new(),
            tags: Vec::new(),
            relations: Vec::new(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }
}

/// A directed edge from the containing entry to `target_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Identifier of the related entry. Dangling references (the target
    /// doesn't exist, or existed and was purged) are tolerated: traversal
    /// skips them silently rather than erroring.
    pub target_id: EntryId,

    /// Scales similarity during traversal. 1.0 is neutral.
    ///
    /// Valid range: `[0.1, 2.0]`, enforced at `add` time by
    /// [`crate::relation::validate_relation`].
    pub weight: f32,

    /// Optional label from an open set. Four labels are recognized as
    /// having inverses (`parent_of`/`child_of`, `depends_on`/`depended_by`);
    /// all others — including `None` — are self-inverse. See
    /// [`crate::relation::inverse_type`].
    pub relation_type: Option<String>,

    /// Creation timestamp of this edge.
    pub created_at: Timestamp,
}

impl Relation {
    /// Creates a new relation to `target_id` with a neutral weight and no
    /// type label, timestamped now.
    pub fn new(target_id: EntryId) -> Self {
        Self {
            target_id,
            weight: 1.0,
            relation_type: None,
            created_at: Timestamp::now(),
        }
    }

    /// Builder-style setter for `weight`.
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Builder-style setter for `relation_type`.
    pub fn with_type(mut self, relation_type: impl Into<String>) -> Self {
        self.relation_type = Some(relation_type.into());
        self
    }
}
