//! Core type definitions for LatticeDB identifiers, timestamps, and metadata values.
//!
//! This module defines the fundamental ID and scalar types used throughout
//! LatticeDB. Entry identifiers use UUID v7 so that, absent an explicit id,
//! natural insertion order is also id order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Identifier for a [`KnowledgeEntry`](crate::entry::KnowledgeEntry).
///
/// 128-bit, unique per shard, stable for the life of the entry.
///
/// # Example
/// ```
/// use latticedb::EntryId;
///
/// let id = EntryId::new();
/// println!("Created entry: {}", id);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Creates a new `EntryId` with a UUID v7 (time-ordered).
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a nil (all zeros) `EntryId`. Useful as a sentinel value.
    #[inline]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns true if this is the nil id.
    #[inline]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the raw UUID bytes, for use as a storage key.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Creates an `EntryId` from raw bytes.
    #[inline]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parses an `EntryId` from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for EntryId {
    /// Returns the nil id. For a new unique id use [`EntryId::new()`].
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in milliseconds.
///
/// i64 so dates far into the future or past (and, defensively, negative
/// clock skew) are representable without panicking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[inline]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as i64)
    }

    /// Creates a timestamp from Unix milliseconds.
    #[inline]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as Unix milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns big-endian bytes, so lexicographic and numeric order agree.
    #[inline]
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A metadata value: the closed sum type `{string, integer, float, bool}`.
///
/// Equality is value equality; deep-structured values (nested objects,
/// arrays) are intentionally not supported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// A UTF-8 string value.
    String(String),
    /// A 64-bit signed integer value.
    Integer(i64),
    /// A 64-bit floating point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl MetadataValue {
    /// Returns the string form, if this is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Metadata map: string key to scalar value. Order is not significant,
/// so a `BTreeMap` gives deterministic iteration for export without
/// needing a separate sort step.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Embedding vector type alias: a fixed-length sequence of 32-bit floats.
pub type Embedding = Vec<f32>;
