//! JsonFileStore - in-memory store persisted as a JSON snapshot file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use super::in_memory::{InMemoryStore, Snapshot};
use super::{Record, RecordStore, StoreError};

/// Record store that mirrors every mutation to a snapshot file.
///
/// Reads are served from memory. A mutation is applied to a copy of the
/// dataset, the copy is written to `<path>.tmp` and renamed over `<path>`,
/// and only then does it replace the live data. A failed write leaves both
/// memory and disk as they were.
#[derive(Clone)]
pub struct JsonFileStore {
    memory: InMemoryStore,
    path: Arc<PathBuf>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading the existing snapshot if there is one.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let memory = match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Serde(format!("{}: {}", path.display(), e)))?;
                info!("Loaded store snapshot from {}", path.display());
                InMemoryStore::from_snapshot(snapshot)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No snapshot at {}, starting empty", path.display());
                InMemoryStore::new()
            }
            Err(e) => return Err(StoreError::Io(format!("{}: {}", path.display(), e))),
        };

        Ok(Self {
            memory,
            path: Arc::new(path),
        })
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `change` against a copy of the data and persist it before making
    /// it live. `change` reports whether anything needs writing.
    fn commit<T>(
        &self,
        operation: &str,
        change: impl FnOnce(&mut Snapshot) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        // The write lock is held across the file write so commits are serialized.
        let mut live = self.memory.write(operation)?;
        let mut next = (*live).clone();

        let (out, changed) = change(&mut next)?;
        if changed {
            self.write_file(&next)?;
            *live = next;
        }
        Ok(out)
    }

    fn write_file(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serde(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &*self.path).map_err(|e| StoreError::Io(e.to_string()))?;

        debug!("Flushed {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn get_record<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.memory.get_record(id)
    }

    fn insert<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        self.commit("insert", |data| data.insert(record).map(|()| ((), true)))
    }

    fn upsert<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        self.commit("upsert", |data| data.upsert(record).map(|()| ((), true)))
    }

    fn delete<R: Record>(&self, id: &str) -> Result<bool, StoreError> {
        self.commit("delete", |data| {
            let existed = data.delete::<R>(id);
            Ok((existed, existed))
        })
    }

    fn modify_record<R: Record>(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut R) -> bool,
    ) -> Result<Option<R>, StoreError> {
        self.commit("modify", |data| {
            Ok(match data.modify(id, apply)? {
                Some((record, changed)) => (Some(record), changed),
                None => (None, false),
            })
        })
    }

    fn find_records<R: Record>(
        &self,
        predicate: &dyn Fn(&R) -> bool,
    ) -> Result<Vec<R>, StoreError> {
        self.memory.find_records(predicate)
    }
}
