//! Error types for LatticeDB.
//!
//! LatticeDB uses a hierarchical error system:
//! - [`LatticeError`] is the top-level error returned by all public APIs
//! - Specific error types ([`StoreError`], [`ValidationError`], [`NotFoundError`])
//!   provide detail
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use latticedb::{StoreCore, Config, Result};
//!
//! fn example() -> Result<()> {
//!     let store = StoreCore::open("./lattice.db", None, Config::default())?;
//!     // ... operations that may fail ...
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for LatticeDB operations.
pub type Result<T> = std::result::Result<T, LatticeError>;

/// Top-level error enum for all LatticeDB operations.
///
/// This is the only error type returned by public APIs. Use pattern
/// matching or the `is_*()` predicates to handle specific cases.
///
/// `InvalidArgument` and `Validation` together cover malformed or
/// out-of-range caller input; `NotFound` covers missing ids; `Store` covers
/// document-store failures. Dangling relation targets and a stale HNSW
/// index are not represented here at all — they are never raised to the
/// caller (logged at debug / silently degraded, respectively).
#[derive(Debug, Error)]
pub enum LatticeError {
    /// Document store layer error (I/O, corruption, transactions).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Input validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Requested entity not found.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// General I/O error (import/export file handling).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or missing required argument, not covered by `ValidationError`.
    ///
    /// Used for invalid-argument search errors (null/empty query vector,
    /// negative k).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Vector index error (HNSW operations).
    #[error("index error: {0}")]
    Index(String),
}

impl LatticeError {
    /// Creates an invalid-argument error with the given message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an index error with the given message.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// Returns true if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidArgument(_))
    }

    /// Returns true if this is a store error.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if this is an index error.
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

/// Document-store-related errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database file or data is corrupted.
    #[error("database corrupted: {0}")]
    Corrupted(String),

    /// Database file not found at expected path.
    #[error("database not found: {0}")]
    DatabaseNotFound(PathBuf),

    /// Database is locked by another process.
    #[error("database is locked by another writer")]
    DatabaseLocked,

    /// Transaction failed (commit, rollback, etc.).
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Error from the redb storage engine.
    #[error("storage engine error: {0}")]
    Redb(String),

    /// Database schema version doesn't match expected version.
    #[error("schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Expected schema version.
        expected: u32,
        /// Actual schema version found in database.
        found: u32,
    },
}

impl StoreError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Creates a transaction error with the given message.
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<redb::Error> for StoreError {
    fn from(err: redb::Error) -> Self {
        StoreError::Redb(err.to_string())
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Redb(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Transaction(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Transaction(format!("commit failed: {}", err))
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Redb(format!("table error: {}", err))
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Redb(format!("storage error: {}", err))
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

macro_rules! lattice_error_from_store {
    ($t:ty) => {
        impl From<$t> for LatticeError {
            fn from(err: $t) -> Self {
                LatticeError::Store(StoreError::from(err))
            }
        }
    };
}

lattice_error_from_store!(redb::Error);
lattice_error_from_store!(redb::DatabaseError);
lattice_error_from_store!(redb::TransactionError);
lattice_error_from_store!(redb::CommitError);
lattice_error_from_store!(redb::TableError);
lattice_error_from_store!(redb::StorageError);
lattice_error_from_store!(bincode::Error);

/// Validation errors for input data.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Embedding dimension doesn't match the store's configured dimension `D`.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension `D`.
        expected: usize,
        /// Actual dimension provided.
        got: usize,
    },

    /// A field has an invalid value.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// Content exceeds maximum allowed size.
    #[error("content too large: {size} bytes (max: {max} bytes)")]
    ContentTooLarge {
        /// Actual content size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },

    /// A required field is missing or empty.
    #[error("required field missing: {field}")]
    RequiredField {
        /// Name of the missing field.
        field: String,
    },
}

impl ValidationError {
    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a content-too-large error.
    pub fn content_too_large(size: usize, max: usize) -> Self {
        Self::ContentTooLarge { size, max }
    }

    /// Creates a required-field error.
    pub fn required_field(field: impl Into<String>) -> Self {
        Self::RequiredField {
            field: field.into(),
        }
    }
}

/// Not-found errors for specific entity types.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// Entry with the given id not found.
    #[error("entry not found: {0}")]
    Entry(String),

    /// Import file not found.
    #[error("file not found: {0}")]
    File(PathBuf),
}

impl NotFoundError {
    /// Creates an entry-not-found error.
    pub fn entry(id: impl ToString) -> Self {
        Self::Entry(id.to_string())
    }

    /// Creates a file-not-found error.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::SchemaVersionMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "schema version mismatch: expected 2, found 1"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::dimension_mismatch(384, 768);
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: expected 384, got 768"
        );
    }

    #[test]
    fn test_not_found_error_display() {
        let err = NotFoundError::entry("abc-123");
        assert_eq!(err.to_string(), "entry not found: abc-123");
    }

    #[test]
    fn test_is_not_found() {
        let err: LatticeError = NotFoundError::entry("test").into();
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_is_validation_covers_invalid_argument() {
        let err = LatticeError::invalid_argument("query must not be empty");
        assert!(err.is_validation());
        assert!(!err.is_not_found());

        let err: LatticeError = ValidationError::required_field("content").into();
        assert!(err.is_validation());
    }

    #[test]
    fn test_index_error_display() {
        let err = LatticeError::index("rebuild in progress");
        assert_eq!(err.to_string(), "index error: rebuild in progress");
        assert!(err.is_index());
        assert!(!err.is_store());
    }

    #[test]
    fn test_error_conversion_chain() {
        fn inner() -> Result<()> {
            Err(StoreError::corrupted("test corruption"))?
        }

        let result = inner();
        assert!(result.is_err());
        assert!(result.unwrap_err().is_store());
    }
}
