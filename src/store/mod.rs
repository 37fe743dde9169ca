//! Record store - typed CRUD storage for users and books.
//!
//! A record is any serializable type that names its collection and exposes
//! a string id. Stores are explicit handles: construct one at startup and
//! clone it into every component that needs persistence.
//!
//! ## Example
//!
//! ```ignore
//! use bookshelf::store::{CollectionsExt, InMemoryStore};
//! use bookshelf::Book;
//!
//! let store = InMemoryStore::new();
//! store.collection::<Book>().insert(&book)?;
//! let loaded = store.collection::<Book>().get(&book.id)?;
//! ```
//!
//! ## Backends
//!
//! - [`InMemoryStore`] keeps everything in a `HashMap` behind an `RwLock`.
//! - [`JsonFileStore`] wraps the in-memory store and rewrites a JSON snapshot
//!   on disk after every mutation.
//!
//! A single record can be edited atomically with
//! [`RecordStore::modify_record`]. There are no transactions spanning several
//! records, so a lookup followed by an insert (the email uniqueness check)
//! can interleave with another request doing the same.

mod collection;
mod in_memory;
mod json_file;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use collection::{Collection, CollectionsExt};
pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;

/// Trait for types that can be kept in a [`RecordStore`].
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection name for this record type (e.g. "users", "books").
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this record.
    fn id(&self) -> &str;
}

/// Error type for record store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record with the same id already exists.
    #[error("record already exists: {collection}:{id}")]
    Conflict { collection: String, id: String },
    /// Serialization/deserialization error.
    #[error("record serialization error: {0}")]
    Serde(String),
    /// Storage-level error (poisoned lock and similar).
    #[error("record storage error: {0}")]
    Storage(String),
    /// Snapshot file could not be read or written.
    #[error("record snapshot i/o error: {0}")]
    Io(String),
}

/// Abstract CRUD storage for records.
///
/// Methods that would collide with the short names on [`Collection`] carry a
/// `_record`/`_records` suffix.
pub trait RecordStore: Send + Sync {
    /// Get a record by id. Returns `None` if not found.
    fn get_record<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError>;

    /// Insert a new record. Fails with `Conflict` if the id is taken.
    fn insert<R: Record>(&self, record: &R) -> Result<(), StoreError>;

    /// Insert or replace a record.
    fn upsert<R: Record>(&self, record: &R) -> Result<(), StoreError>;

    /// Delete a record by id. Returns true if it existed.
    fn delete<R: Record>(&self, id: &str) -> Result<bool, StoreError>;

    /// Read-modify-write one record while holding the store's write lock.
    ///
    /// `apply` edits the record and returns whether it changed; `false`
    /// leaves the stored record untouched. Returns the record as stored
    /// afterwards, or `None` if it does not exist.
    fn modify_record<R: Record>(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut R) -> bool,
    ) -> Result<Option<R>, StoreError>;

    /// Find records matching a predicate, in insertion order.
    fn find_records<R: Record>(
        &self,
        predicate: &dyn Fn(&R) -> bool,
    ) -> Result<Vec<R>, StoreError>;

    /// Find the first record (in insertion order) matching a predicate.
    fn find_one_record<R: Record>(
        &self,
        predicate: &dyn Fn(&R) -> bool,
    ) -> Result<Option<R>, StoreError> {
        Ok(self.find_records(predicate)?.into_iter().next())
    }

    /// All records of a collection, in insertion order.
    fn all_records<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        self.find_records(&|_: &R| true)
    }
}
