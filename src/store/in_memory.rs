//! InMemoryStore - HashMap-backed record store for development and tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{Record, RecordStore, StoreError};

/// Internal stored representation of a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredRecord {
    /// Insertion sequence, kept across upserts so listings stay stable.
    seq: u64,
    value: Value,
}

/// The whole dataset. Also the on-disk format of [`super::JsonFileStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    next_seq: u64,
    records: HashMap<String, StoredRecord>,
}

fn make_key(collection: &str, id: &str) -> String {
    format!("{}:{}", collection, id)
}

fn encode<R: Record>(record: &R) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Serde(e.to_string()))
}

fn decode<R: Record>(value: &Value) -> Result<R, StoreError> {
    R::deserialize(value).map_err(|e| StoreError::Serde(e.to_string()))
}

impl Snapshot {
    pub(crate) fn get<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.records
            .get(&make_key(R::COLLECTION, id))
            .map(|stored| decode(&stored.value))
            .transpose()
    }

    pub(crate) fn insert<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        let key = make_key(R::COLLECTION, record.id());
        if self.records.contains_key(&key) {
            return Err(StoreError::Conflict {
                collection: R::COLLECTION.to_string(),
                id: record.id().to_string(),
            });
        }

        let value = encode(record)?;
        let seq = self.next_seq();
        self.records.insert(key, StoredRecord { seq, value });
        Ok(())
    }

    pub(crate) fn upsert<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        let key = make_key(R::COLLECTION, record.id());
        let value = encode(record)?;

        let seq = match self.records.get(&key) {
            Some(existing) => existing.seq,
            None => self.next_seq(),
        };
        self.records.insert(key, StoredRecord { seq, value });
        Ok(())
    }

    pub(crate) fn delete<R: Record>(&mut self, id: &str) -> bool {
        self.records.remove(&make_key(R::COLLECTION, id)).is_some()
    }

    /// Returns the record as stored afterwards and whether `apply` changed it.
    pub(crate) fn modify<R: Record>(
        &mut self,
        id: &str,
        apply: &mut dyn FnMut(&mut R) -> bool,
    ) -> Result<Option<(R, bool)>, StoreError> {
        let Some(stored) = self.records.get_mut(&make_key(R::COLLECTION, id)) else {
            return Ok(None);
        };

        let current: R = decode(&stored.value)?;
        let mut working = current.clone();
        if !apply(&mut working) {
            return Ok(Some((current, false)));
        }

        stored.value = encode(&working)?;
        Ok(Some((working, true)))
    }

    pub(crate) fn find<R: Record>(&self, predicate: &dyn Fn(&R) -> bool) -> Vec<R> {
        let prefix = format!("{}:", R::COLLECTION);

        let mut matches: Vec<(u64, R)> = Vec::new();
        for (key, stored) in self.records.iter() {
            if !key.starts_with(&prefix) {
                continue;
            }
            match decode::<R>(&stored.value) {
                Ok(record) if predicate(&record) => matches.push((stored.seq, record)),
                Ok(_) => {}
                Err(e) => warn!("Skipping undecodable record {key}: {e}"),
            }
        }

        matches.sort_by_key(|(seq, _)| *seq);
        matches.into_iter().map(|(_, record)| record).collect()
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// In-memory record store backed by a HashMap.
///
/// Storage key is `"collection:id"`. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    storage: Arc<RwLock<Snapshot>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            storage: Arc::new(RwLock::new(snapshot)),
        }
    }

    pub(crate) fn read(&self, operation: &str) -> Result<RwLockReadGuard<'_, Snapshot>, StoreError> {
        self.storage
            .read()
            .map_err(|_| StoreError::Storage(format!("lock poisoned during {}", operation)))
    }

    pub(crate) fn write(
        &self,
        operation: &str,
    ) -> Result<RwLockWriteGuard<'_, Snapshot>, StoreError> {
        self.storage
            .write()
            .map_err(|_| StoreError::Storage(format!("lock poisoned during {}", operation)))
    }
}

impl RecordStore for InMemoryStore {
    fn get_record<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.read("get")?.get(id)
    }

    fn insert<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        self.write("insert")?.insert(record)
    }

    fn upsert<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        self.write("upsert")?.upsert(record)
    }

    fn delete<R: Record>(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.write("delete")?.delete::<R>(id))
    }

    fn modify_record<R: Record>(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut R) -> bool,
    ) -> Result<Option<R>, StoreError> {
        let modified = self.write("modify")?.modify(id, apply)?;
        Ok(modified.map(|(record, _)| record))
    }

    fn find_records<R: Record>(
        &self,
        predicate: &dyn Fn(&R) -> bool,
    ) -> Result<Vec<R>, StoreError> {
        Ok(self.read("find")?.find(predicate))
    }
}
