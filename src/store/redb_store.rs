//! redb-backed [`DocumentStore`] implementation.
//!
//! [redb](https://docs.rs/redb) is a pure-Rust embedded key-value store
//! with MVCC reads and single-writer transactions, matching the
//! single-writer-per-shard concurrency model this crate wants.

use std::path::{Path, PathBuf};

use redb::Database;
use tracing::{debug, info, instrument, warn};

use super::schema::{DatabaseMetadata, ENTRIES_TABLE, METADATA_TABLE, SCHEMA_VERSION};
use super::DocumentStore;
use crate::entry::KnowledgeEntry;
use crate::error::{LatticeError, Result, StoreError, ValidationError};
use crate::types::EntryId;

/// redb storage engine wrapper.
///
/// `Send + Sync`: redb synchronizes readers via MVCC and writers via an
/// internal exclusive lock, so this type needs no locking of its own.
#[derive(Debug)]
pub struct RedbDocumentStore {
    db: Database,
    metadata: DatabaseMetadata,
    path: PathBuf,
}

impl RedbDocumentStore {
    /// Opens or creates a database at `path`, validating `dimension`
    /// against stored metadata if the database already exists.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref();
        let exists = path.exists();
        debug!(exists, "opening document store");

        let db = Database::builder().create(path).map_err(|e| {
            if e.to_string().contains("lock") {
                LatticeError::Store(StoreError::DatabaseLocked)
            } else {
                LatticeError::Store(StoreError::Redb(e.to_string()))
            }
        })?;

        if exists {
            Self::open_existing(db, path.to_path_buf(), dimension)
        } else {
            Self::initialize_new(db, path.to_path_buf(), dimension)
        }
    }

    #[instrument(skip(db))]
    fn initialize_new(db: Database, path: PathBuf, dimension: usize) -> Result<Self> {
        info!("initializing new document store");
        let metadata = DatabaseMetadata::new(dimension);

        let write_txn = db.begin_write()?;
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let bytes = bincode::serialize(&metadata)?;
            meta_table.insert(DatabaseMetadata::key(), bytes.as_slice())?;
            let _ = write_txn.open_table(ENTRIES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db, metadata, path })
    }

    #[instrument(skip(db))]
    fn open_existing(db: Database, path: PathBuf, dimension: usize) -> Result<Self> {
        info!("opening existing document store");
        let read_txn = db.begin_read()?;
        let mut metadata = {
            let meta_table = read_txn
                .open_table(METADATA_TABLE)
                .map_err(|e| StoreError::corrupted(format!("cannot open metadata table: {e}")))?;
            let bytes = meta_table
                .get(DatabaseMetadata::key())?
                .ok_or_else(|| StoreError::corrupted("missing database metadata"))?;
            bincode::deserialize::<DatabaseMetadata>(bytes.value())
                .map_err(|e| StoreError::corrupted(format!("invalid metadata: {e}")))?
        };
        drop(read_txn);

        if metadata.schema_version != SCHEMA_VERSION {
            warn!(expected = SCHEMA_VERSION, found = metadata.schema_version, "schema mismatch");
            return Err(StoreError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found: metadata.schema_version,
            }
            .into());
        }
        if metadata.dimension != dimension {
            warn!(expected = dimension, found = metadata.dimension, "dimension mismatch");
            return Err(LatticeError::Validation(ValidationError::dimension_mismatch(
                dimension,
                metadata.dimension,
            )));
        }

        metadata.touch();
        let write_txn = db.begin_write()?;
        {
            let mut meta_table = write_txn.open_table(METADATA_TABLE)?;
            let bytes = bincode::serialize(&metadata)?;
            meta_table.insert(DatabaseMetadata::key(), bytes.as_slice())?;
        }
        write_txn.commit()?;

        Ok(Self { db, metadata, path })
    }

    /// Path to the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fixed embedding dimension this store was opened with.
    pub fn dimension(&self) -> usize {
        self.metadata.dimension
    }
}

fn encode_id(id: EntryId) -> [u8; 16] {
    *id.as_bytes()
}

impl DocumentStore for RedbDocumentStore {
    #[instrument(skip(self), fields(id = %id))]
    fn get(&self, id: EntryId) -> Result<Option<KnowledgeEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;
        let key = encode_id(id);
        match table.get(&key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes.value())?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, entry), fields(id = %entry.id))]
    fn upsert(&self, entry: &KnowledgeEntry) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES_TABLE)?;
            let key = encode_id(entry.id);
            let bytes = bincode::serialize(entry)?;
            table.insert(&key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    fn upsert_batch(&self, entries: &[KnowledgeEntry]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES_TABLE)?;
            for entry in entries {
                let key = encode_id(entry.id);
                let bytes = bincode::serialize(entry)?;
                table.insert(&key, bytes.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    fn delete(&self, id: EntryId) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES_TABLE)?;
            let key = encode_id(id);
            table.remove(&key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<KnowledgeEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;
        let mut out = Vec::new();
        for row in table.iter()? {
            let (_, value) = row?;
            out.push(bincode::deserialize(value.value())?);
        }
        Ok(out)
    }

    fn len(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;
        Ok(table.len()? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(dimension: usize) -> (RedbDocumentStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lattice.db");
        (RedbDocumentStore::open(&path, dimension).unwrap(), dir)
    }

    #[test]
    fn test_upsert_and_get_roundtrip() {
        let (store, _dir) = temp_store(4);
        let mut entry = KnowledgeEntry::new("hello");
        entry.embedding = Some(vec![1.0, 2.0, 3.0, 4.0]);
        store.upsert(&entry).unwrap();

        let fetched = store.get(entry.id).unwrap().unwrap();
        assert_eq!(fetched, entry);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (store, _dir) = temp_store(4);
        assert!(store.get(EntryId::new()).unwrap().is_none());
    }

    #[test]
    fn test_upsert_overwrites() {
        let (store, _dir) = temp_store(4);
        let mut entry = KnowledgeEntry::new("v1");
        store.upsert(&entry).unwrap();
        entry.content = "v2".to_string();
        store.upsert(&entry).unwrap();

        let fetched = store.get(entry.id).unwrap().unwrap();
        assert_eq!(fetched.content, "v2");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_delete_removes_entry() {
        let (store, _dir) = temp_store(4);
        let entry = KnowledgeEntry::new("gone soon");
        store.upsert(&entry).unwrap();
        store.delete(entry.id).unwrap();
        assert!(store.get(entry.id).unwrap().is_none());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_upsert_batch_and_scan_all() {
        let (store, _dir) = temp_store(4);
        let entries: Vec<KnowledgeEntry> = (0..5).map(|i| KnowledgeEntry::new(format!("e{i}"))).collect();
        store.upsert_batch(&entries).unwrap();

        assert_eq!(store.len().unwrap(), 5);
        let scanned = store.scan_all().unwrap();
        assert_eq!(scanned.len(), 5);
    }

    #[test]
    fn test_reopen_validates_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lattice.db");
        {
            RedbDocumentStore::open(&path, 4).unwrap();
        }
        let err = RedbDocumentStore::open(&path, 8).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_reopen_same_dimension_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lattice.db");
        {
            let store = RedbDocumentStore::open(&path, 4).unwrap();
            let entry = KnowledgeEntry::new("persisted");
            store.upsert(&entry).unwrap();
        }
        let store = RedbDocumentStore::open(&path, 4).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }
}
