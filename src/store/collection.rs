use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::storage::SharedStorage;
use crate::store::observer::{Listeners, Subscription};

/// A JSON value persisted in full under one storage key
pub struct Snapshot<T> {
    storage: SharedStorage,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> Snapshot<T> {
    pub fn new(storage: SharedStorage, key: &'static str) -> Self {
        Self {
            storage,
            key,
            _marker: PhantomData,
        }
    }

    /// `Ok(None)` when nothing is stored; an error when the stored value is unreadable
    pub fn load(&self) -> Result<Option<T>> {
        match self.storage.get_item(self.key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.storage.set_item(self.key, &raw)
    }

    /// Save, logging instead of returning the failure. Returns whether the write landed.
    pub fn save_or_log(&self, value: &T) -> bool {
        match self.save(value) {
            Ok(()) => {
                debug!("Saved '{}'", self.key);
                true
            }
            Err(e) => {
                error!("Failed to save '{}': {}", self.key, e);
                false
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(self.key)
    }
}

/// An in-memory list that is the source of truth for one store.
///
/// Every committed mutation writes the whole list back to storage and then
/// notifies listeners. A failed write is logged and the in-memory change is
/// kept, so memory and storage can diverge until the next successful save.
pub struct Collection<T> {
    records: Arc<RwLock<Vec<T>>>,
    snapshot: Snapshot<Vec<T>>,
    listeners: Listeners,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            snapshot: self.snapshot.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<T> Collection<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Load the list stored under `key`, or build it with `seed` and persist it
    pub fn load_or_seed<F>(storage: SharedStorage, key: &'static str, seed: F) -> Self
    where
        F: FnOnce() -> Vec<T>,
    {
        let snapshot: Snapshot<Vec<T>> = Snapshot::new(storage, key);

        let records = match snapshot.load() {
            Ok(Some(records)) => {
                debug!("Loaded {} records from '{}'", records.len(), key);
                records
            }
            Ok(None) => {
                info!("No saved '{}', using seed data", key);
                let records = seed();
                snapshot.save_or_log(&records);
                records
            }
            Err(e) => {
                warn!("Could not load '{}' ({}), using seed data", key, e);
                let records = seed();
                snapshot.save_or_log(&records);
                records
            }
        };

        Self {
            records: Arc::new(RwLock::new(records)),
            snapshot,
            listeners: Listeners::new(),
        }
    }

    /// Copy of the current list
    pub fn all(&self) -> Vec<T> {
        self.records.read().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.records.read())
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Apply a mutation. Returning `None` from `f` means nothing changed:
    /// no save and no notification happen.
    pub fn commit<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Option<R>) -> Option<R> {
        let result = {
            let mut records = self.records.write();
            let result = f(&mut records)?;
            self.snapshot.save_or_log(&records);
            result
        };

        self.listeners.notify();
        Some(result)
    }
}
