//! Entry and relation types, plus the validation rules applied at
//! [`StoreCore::add`](crate::StoreCore::add) time.
//!
//! # Constraints
//!
//! - `content`: max 1 MB
//! - `tags`: max 64, each max 256 chars
//! - `relations`: max 256 per entry
//! - relation `weight`: must be in `[0.1, 2.0]`
//! - embedding, if present, must have exactly `D` components

pub mod types;

pub use types::{KnowledgeEntry, Relation};

use crate::error::{LatticeError, ValidationError};

/// Maximum content size in bytes (1 MB). Entries are opaque payloads; this
/// bound exists to keep a single store page-friendly, not to interpret content.
pub const MAX_CONTENT_SIZE: usize = 1024 * 1024;

/// Maximum number of tags per entry.
pub const MAX_TAGS: usize = 64;

/// Maximum length of a single tag.
pub const MAX_TAG_LENGTH: usize = 256;

/// Maximum number of relations per entry.
pub const MAX_RELATIONS: usize = 256;

/// Minimum relation weight.
pub const MIN_RELATION_WEIGHT: f32 = 0.1;

/// Maximum relation weight.
pub const MAX_RELATION_WEIGHT: f32 = 2.0;

/// Validates an entry before it is upserted into the store.
///
/// Checks content size, tag count/length, relation count, relation weight
/// range, and (if an embedding is present) that it matches `dimension`.
/// Does not check cross-entry constraints (dangling relation targets,
/// reciprocity) — those are handled by `StoreCore::add` because they
/// require store lookups.
pub(crate) fn validate_entry(
    entry: &KnowledgeEntry,
    dimension: usize,
) -> Result<(), LatticeError> {
    if entry.content.len() > MAX_CONTENT_SIZE {
        return Err(ValidationError::content_too_large(entry.content.len(), MAX_CONTENT_SIZE).into());
    }

    if entry.tags.len() > MAX_TAGS {
        return Err(ValidationError::invalid_field(
            "tags",
            format!("at most {} tags allowed, got {}", MAX_TAGS, entry.tags.len()),
        )
        .into());
    }
    for tag in &entry.tags {
        if tag.len() > MAX_TAG_LENGTH {
            return Err(ValidationError::invalid_field(
                "tags",
                format!("tag '{tag}' exceeds max length of {MAX_TAG_LENGTH} chars"),
            )
            .into());
        }
    }

    if entry.relations.len() > MAX_RELATIONS {
        return Err(ValidationError::invalid_field(
            "relations",
            format!(
                "at most {} relations allowed, got {}",
                MAX_RELATIONS,
                entry.relations.len()
            ),
        )
        .into());
    }
    for rel in &entry.relations {
        if !(MIN_RELATION_WEIGHT..=MAX_RELATION_WEIGHT).contains(&rel.weight) {
            return Err(ValidationError::invalid_field(
                "relations.weight",
                format!(
                    "must be between {MIN_RELATION_WEIGHT} and {MAX_RELATION_WEIGHT}, got {}",
                    rel.weight
                ),
            )
            .into());
        }
        if rel.target_id == entry.id {
            return Err(ValidationError::invalid_field(
                "relations.target_id",
                "an entry cannot hold a relation to itself",
            )
            .into());
        }
    }

    if let Some(ref emb) = entry.embedding {
        if emb.len() != dimension {
            return Err(ValidationError::dimension_mismatch(dimension, emb.len()).into());
        }
    }

    Ok(())
}
