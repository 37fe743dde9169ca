//! Collection - typed accessor for record CRUD operations.

use std::marker::PhantomData;

use super::{Record, RecordStore, StoreError};

/// Typed wrapper for accessing records of a single collection.
///
/// Provides short method names by delegating to `RecordStore` methods.
pub struct Collection<'a, S, R> {
    store: &'a S,
    _marker: PhantomData<R>,
}

impl<'a, S: RecordStore, R: Record> Collection<'a, S, R> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.store.get_record(id)
    }

    /// Insert a new record. Fails if the id is taken.
    pub fn insert(&self, record: &R) -> Result<(), StoreError> {
        self.store.insert(record)
    }

    /// Insert or replace a record.
    pub fn upsert(&self, record: &R) -> Result<(), StoreError> {
        self.store.upsert(record)
    }

    /// Delete a record by id. Returns true if it existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete::<R>(id)
    }

    /// Edit a record in place under the store's write lock.
    pub fn modify(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut R) -> bool,
    ) -> Result<Option<R>, StoreError> {
        self.store.modify_record(id, apply)
    }

    /// Find records matching a predicate.
    pub fn find(&self, predicate: &dyn Fn(&R) -> bool) -> Result<Vec<R>, StoreError> {
        self.store.find_records(predicate)
    }

    /// Find the first record matching a predicate.
    pub fn find_one(&self, predicate: &dyn Fn(&R) -> bool) -> Result<Option<R>, StoreError> {
        self.store.find_one_record(predicate)
    }

    /// All records in the collection.
    pub fn all(&self) -> Result<Vec<R>, StoreError> {
        self.store.all_records()
    }
}

/// Extension trait for typed collection access on any RecordStore.
pub trait CollectionsExt: RecordStore + Sized {
    /// Get a typed collection accessor.
    fn collection<R: Record>(&self) -> Collection<'_, Self, R> {
        Collection::new(self)
    }
}

impl<S: RecordStore> CollectionsExt for S {}
