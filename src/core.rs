//! `StoreCore`: the single-shard facade tying the document store, vector
//! index, and search engine together.

use std::fs;
use std::path::Path;
use std::sync::RwLock;
use std::time::Instant;

use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::entry::types::{KnowledgeEntry, Relation};
use crate::entry::validate_entry;
use crate::error::{LatticeError, NotFoundError, Result, ValidationError};
use crate::relation::inverse_type;
use crate::search::{SearchEngine, SearchRequest, SearchResult};
use crate::stats::VectorDbStats;
use crate::store::{DocumentStore, RedbDocumentStore};
use crate::types::{EntryId, Metadata, MetadataValue, Timestamp};
use crate::vector::{HnswIndex, VectorIndex};

/// A single shard: one document store, one vector index, one search engine.
///
/// `ShardRouter` owns several of these and routes by id hash; used alone,
/// a `StoreCore` is a complete, non-sharded store.
#[derive(Debug)]
pub struct StoreCore {
    store: RedbDocumentStore,
    index: HnswIndex,
    engine: SearchEngine,
    config: Config,
    opened_at: Instant,
    last_index_rebuild: RwLock<Option<Timestamp>>,
}

impl StoreCore {
    /// Opens (or creates) a store at `path`.
    ///
    /// `password` is accepted for interface parity with encrypted backends
    /// this store doesn't implement, but is rejected with an error rather
    /// than silently ignored: the redb backend has no at-rest encryption
    /// support, and a security-relevant setting that's quietly dropped is
    /// worse than one that's refused.
    #[instrument(skip(path, password, config))]
    pub fn open(path: impl AsRef<Path>, password: Option<&str>, config: Config) -> Result<Self> {
        config.validate()?;
        if password.is_some() {
            return Err(LatticeError::invalid_argument(
                "at-rest encryption is not supported by this document store backend",
            ));
        }

        let store = RedbDocumentStore::open(path, config.dimension)?;
        let index = HnswIndex::new(config.hnsw);

        let mut live: Vec<KnowledgeEntry> = store
            .scan_all()?
            .into_iter()
            .filter(|e| !e.is_deleted && e.embedding.is_some())
            .collect();
        live.sort_by_key(|e| (e.created_at, e.id));
        for entry in &live {
            index.add(entry.id, entry.embedding.as_ref().unwrap())?;
        }
        info!(restored = live.len(), "rebuilt vector index from document store");

        Ok(Self {
            store,
            index,
            engine: SearchEngine::new(config.hnsw.ef_search_default),
            config,
            opened_at: Instant::now(),
            last_index_rebuild: RwLock::new(None),
        })
    }

    /// Inserts a new entry, or updates an existing one if `entry.id` is
    /// already present. A nil id is replaced with a fresh one.
    ///
    /// Maintains the bidirectional relation invariant: for every relation
    /// whose target exists and doesn't already carry a reciprocal edge back
    /// to this entry, a reciprocal edge is added to the target using the
    /// inverse relation type. Dangling targets are tolerated silently.
    #[instrument(skip(self, entry), fields(id = %entry.id))]
    pub fn add(&self, mut entry: KnowledgeEntry) -> Result<EntryId> {
        if entry.id.is_nil() {
            entry.id = EntryId::new();
        }
        validate_entry(&entry, self.config.dimension)?;

        let now = Timestamp::now();
        entry.created_at = match self.store.get(entry.id)? {
            Some(existing) => existing.created_at,
            None => now,
        };
        entry.updated_at = now;

        self.store.upsert(&entry)?;
        if let Some(ref embedding) = entry.embedding {
            self.index.add(entry.id, embedding)?;
        }

        for rel in &entry.relations {
            let Some(mut target) = self.store.get(rel.target_id)? else {
                debug!(target = %rel.target_id, "relation target does not exist, skipping reciprocal edge");
                continue;
            };
            if target.relations.iter().any(|r| r.target_id == entry.id) {
                continue;
            }
            target.relations.push(Relation {
                target_id: entry.id,
                weight: rel.weight,
                relation_type: inverse_type(rel.relation_type.as_deref()),
                created_at: now,
            });
            target.updated_at = now;
            self.store.upsert(&target)?;
        }

        Ok(entry.id)
    }

    /// Adds each entry via [`add`](Self::add) in order.
    ///
    /// Not a single atomic transaction: reciprocal-relation maintenance
    /// needs a store lookup per entry anyway, so there's no batching win
    /// to be had beyond what `add` already does per call.
    pub fn add_batch(&self, entries: Vec<KnowledgeEntry>) -> Result<Vec<EntryId>> {
        entries.into_iter().map(|e| self.add(e)).collect()
    }

    /// Runs a search request against this shard.
    pub fn search(&self, request: &SearchRequest, cancel: Option<&CancellationToken>) -> Result<Vec<SearchResult>> {
        self.engine.search(request, &self.store, &self.index, cancel)
    }

    /// Soft-deletes an entry: sets `is_deleted`, removes it from the
    /// vector index, but keeps it in the document store. Idempotent; a
    /// missing or already-deleted id is a no-op.
    #[instrument(skip(self), fields(id = %id))]
    pub fn mark_for_deletion(&self, id: EntryId) -> Result<()> {
        let Some(mut entry) = self.store.get(id)? else {
            return Ok(());
        };
        if entry.is_deleted {
            return Ok(());
        }
        entry.is_deleted = true;
        entry.deleted_at = Some(Timestamp::now());
        self.store.upsert(&entry)?;
        self.index.remove(id)?;
        Ok(())
    }

    /// Restores every soft-deleted entry and re-adds any with an embedding
    /// back into the vector index.
    pub fn clear_deleted_flags(&self) -> Result<()> {
        for mut entry in self.store.scan_all()?.into_iter().filter(|e| e.is_deleted) {
            entry.is_deleted = false;
            entry.deleted_at = None;
            if let Some(ref embedding) = entry.embedding {
                self.index.add(entry.id, embedding)?;
            }
            self.store.upsert(&entry)?;
        }
        Ok(())
    }

    /// Count of entries currently flagged `is_deleted`.
    pub fn get_deleted_count(&self) -> Result<u64> {
        Ok(self.store.scan_all()?.into_iter().filter(|e| e.is_deleted).count() as u64)
    }

    /// True if the deleted count exceeds the configured absolute or ratio
    /// threshold.
    pub fn should_rebuild(&self) -> Result<bool> {
        let total = self.store.len()? as u64;
        let deleted = self.get_deleted_count()?;
        if deleted > self.config.rebuild_threshold_count {
            return Ok(true);
        }
        Ok(total > 0 && deleted as f64 > self.config.rebuild_threshold_ratio * total as f64)
    }

    /// Rebuilds the vector index from scratch over the current
    /// id→embedding mappings, in original insertion order.
    ///
    /// Soft-deleted entries are **not** restored by this call. Clearing
    /// tombstones automatically as part of rebuild would make entries
    /// marked for deletion reappear in search results as a side effect of
    /// housekeeping, so tombstones are preserved across rebuild instead.
    /// Call `clear_deleted_flags` explicitly if that's what's wanted.
    #[instrument(skip(self))]
    pub fn rebuild_index(&self) -> Result<()> {
        self.index.rebuild()?;
        *self.last_index_rebuild.write().unwrap() = Some(Timestamp::now());
        info!("vector index rebuilt");
        Ok(())
    }

    /// Hard-deletes every entry flagged `is_deleted`. Returns the number
    /// purged.
    #[instrument(skip(self))]
    pub fn purge_deleted(&self) -> Result<u64> {
        let mut purged = 0u64;
        for entry in self.store.scan_all()?.into_iter().filter(|e| e.is_deleted) {
            self.store.delete(entry.id)?;
            purged += 1;
        }
        info!(purged, "purged soft-deleted entries");
        Ok(purged)
    }

    /// Imports entries from a JSON array file. Object keys are matched
    /// case-insensitively against both camelCase and PascalCase field
    /// names, so files produced by either convention import cleanly. Each
    /// parsed entry goes through [`add`](Self::add), so validation and
    /// relation maintenance apply as usual.
    #[instrument(skip(self, path))]
    pub fn import_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LatticeError::NotFound(NotFoundError::file(path))
            } else {
                LatticeError::Io(e)
            }
        })?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| LatticeError::invalid_argument(format!("malformed import JSON: {e}")))?;
        let array = value
            .as_array()
            .ok_or_else(|| LatticeError::invalid_argument("import file must contain a JSON array"))?;

        let mut imported = 0usize;
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| LatticeError::invalid_argument("each import entry must be a JSON object"))?;
            let entry = entry_from_json(obj)?;
            self.add(entry)?;
            imported += 1;
        }
        info!(imported, "imported entries from JSON");
        Ok(imported)
    }

    /// Exports every entry (including soft-deleted ones) to an indented
    /// JSON array file using PascalCase field names.
    #[instrument(skip(self, path))]
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let entries = self.store.scan_all()?;
        let array: Vec<Value> = entries.iter().map(entry_to_json).collect();
        let count = array.len();
        let text = serde_json::to_string_pretty(&Value::Array(array))
            .map_err(|e| LatticeError::Store(crate::error::StoreError::serialization(e.to_string())))?;
        fs::write(path, text)?;
        Ok(count)
    }

    /// Aggregates usage and size statistics for this shard.
    pub fn get_stats(&self) -> Result<VectorDbStats> {
        let entries = self.store.scan_all()?;
        let mut category_counts = std::collections::BTreeMap::new();
        let mut tag_distribution = std::collections::BTreeMap::new();
        let mut memory_usage: u64 = 0;

        for entry in &entries {
            memory_usage += entry.content.len() as u64;
            memory_usage += entry.embedding.as_ref().map_or(0, |e| (e.len() * 4) as u64);
            if let Some(MetadataValue::String(category)) = entry.metadata.get("category") {
                *category_counts.entry(category.clone()).or_insert(0u64) += 1;
            }
            for tag in &entry.tags {
                *tag_distribution.entry(tag.clone()).or_insert(0u64) += 1;
            }
        }

        let database_size_bytes = fs::metadata(self.store.path()).map(|m| m.len()).unwrap_or(0);

        Ok(VectorDbStats {
            total_entries: entries.len() as u64,
            index_size: 0,
            hnsw_index_size: self.index.count() as u64,
            memory_usage,
            last_updated: Timestamp::now(),
            last_index_rebuild: *self.last_index_rebuild.read().unwrap(),
            uptime_ms: self.opened_at.elapsed().as_millis() as u64,
            total_searches: self.engine.total_searches(),
            average_search_time_ms: self.engine.average_search_time_ms(),
            average_recall: 0.0,
            database_size_bytes,
            active_connections: 1,
            metadata_category_counts: category_counts,
            tag_distribution,
        })
    }
}

fn get_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    for name in names {
        if let Some(v) = obj.get(*name) {
            return Some(v);
        }
        for (k, v) in obj {
            if k.eq_ignore_ascii_case(name) {
                return Some(v);
            }
        }
    }
    None
}

fn entry_from_json(obj: &Map<String, Value>) -> Result<KnowledgeEntry> {
    let id = match get_field(obj, &["id"]).and_then(Value::as_str) {
        Some(s) => EntryId::parse(s).ok_or_else(|| LatticeError::invalid_argument(format!("invalid id: {s}")))?,
        None => EntryId::new(),
    };
    let content = get_field(obj, &["content"])
        .and_then(Value::as_str)
        .ok_or_else(|| LatticeError::Validation(ValidationError::required_field("content")))?
        .to_string();
    let embedding = get_field(obj, &["embedding"]).and_then(Value::as_array).map(|arr| {
        arr.iter().filter_map(Value::as_f64).map(|f| f as f32).collect::<Vec<f32>>()
    });
    let metadata: Metadata = get_field(obj, &["metadata"])
        .and_then(Value::as_object)
        .map(|m| m.iter().filter_map(|(k, v)| metadata_value(v).map(|mv| (k.clone(), mv))).collect())
        .unwrap_or_default();
    let tags = get_field(obj, &["tags"])
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();
    let relations = get_field(obj, &["relations"])
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_object().and_then(relation_from_json)).collect())
        .unwrap_or_default();
    let created_at = get_field(obj, &["createdAt", "created_at"])
        .and_then(Value::as_i64)
        .map(Timestamp::from_millis)
        .unwrap_or_else(Timestamp::now);
    let updated_at = get_field(obj, &["updatedAt", "updated_at"])
        .and_then(Value::as_i64)
        .map(Timestamp::from_millis)
        .unwrap_or(created_at);
    let is_deleted = get_field(obj, &["isDeleted", "is_deleted"]).and_then(Value::as_bool).unwrap_or(false);
    let deleted_at = get_field(obj, &["deletedAt", "deleted_at"]).and_then(Value::as_i64).map(Timestamp::from_millis);

    Ok(KnowledgeEntry {
        id,
        content,
        embedding,
        metadata,
        tags,
        relations,
        created_at,
        updated_at,
        is_deleted,
        deleted_at,
    })
}

fn relation_from_json(obj: &Map<String, Value>) -> Option<Relation> {
    let target_id = get_field(obj, &["targetId", "target_id"]).and_then(Value::as_str).and_then(EntryId::parse)?;
    let weight = get_field(obj, &["weight"]).and_then(Value::as_f64).map(|w| w as f32).unwrap_or(1.0);
    let relation_type = get_field(obj, &["relationType", "relation_type"]).and_then(Value::as_str).map(String::from);
    let created_at = get_field(obj, &["createdAt", "created_at"])
        .and_then(Value::as_i64)
        .map(Timestamp::from_millis)
        .unwrap_or_else(Timestamp::now);
    Some(Relation {
        target_id,
        weight,
        relation_type,
        created_at,
    })
}

fn metadata_value(v: &Value) -> Option<MetadataValue> {
    match v {
        Value::String(s) => Some(MetadataValue::String(s.clone())),
        Value::Bool(b) => Some(MetadataValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(MetadataValue::Integer(i))
            } else {
                n.as_f64().map(MetadataValue::Float)
            }
        }
        _ => None,
    }
}

fn entry_to_json(entry: &KnowledgeEntry) -> Value {
    let metadata: Map<String, Value> = entry
        .metadata
        .iter()
        .map(|(k, v)| {
            let jv = match v {
                MetadataValue::String(s) => json!(s),
                MetadataValue::Integer(i) => json!(i),
                MetadataValue::Float(f) => json!(f),
                MetadataValue::Bool(b) => json!(b),
            };
            (k.clone(), jv)
        })
        .collect();

    let relations: Vec<Value> = entry
        .relations
        .iter()
        .map(|r| {
            json!({
                "TargetId": r.target_id.to_string(),
                "Weight": r.weight,
                "RelationType": r.relation_type,
                "CreatedAt": r.created_at.as_millis(),
            })
        })
        .collect();

    json!({
        "Id": entry.id.to_string(),
        "Content": entry.content,
        "Embedding": entry.embedding,
        "Metadata": metadata,
        "Tags": entry.tags,
        "Relations": relations,
        "CreatedAt": entry.created_at.as_millis(),
        "UpdatedAt": entry.updated_at.as_millis(),
        "IsDeleted": entry.is_deleted,
        "DeletedAt": entry.deleted_at.map(Timestamp::as_millis),
    })
}
