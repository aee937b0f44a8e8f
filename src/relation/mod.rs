//! Relation-type inverse mapping.
//!
//! A [`Relation`](crate::entry::Relation) carries an optional type label
//! drawn from an open set. Four labels are recognized as having inverses;
//! every other label (including no label at all) is self-inverse. This
//! mapping drives the bidirectional-edge maintenance invariant: when an
//! entry gains a relation to a target that exists, the target gains a
//! reciprocal edge back with the inverse type.

/// `parent_of` inverts to `child_of` and vice versa.
pub const PARENT_OF: &str = "parent_of";
/// See [`PARENT_OF`].
pub const CHILD_OF: &str = "child_of";
/// `depends_on` inverts to `depended_by` and vice versa.
pub const DEPENDS_ON: &str = "depends_on";
/// See [`DEPENDS_ON`].
pub const DEPENDED_BY: &str = "depended_by";

/// Returns the inverse of a relation type label.
///
/// `parent_of ↔ child_of` and `depends_on ↔ depended_by` are the only
/// recognized pairs; every other label, including `None`, is self-inverse.
pub fn inverse_type(relation_type: Option<&str>) -> Option<String> {
    match relation_type {
        Some(PARENT_OF) => Some(CHILD_OF.to_string()),
        Some(CHILD_OF) => Some(PARENT_OF.to_string()),
        Some(DEPENDS_ON) => Some(DEPENDED_BY.to_string()),
        Some(DEPENDED_BY) => Some(DEPENDS_ON.to_string()),
        other => other.map(str::to_string),
    }
}
