//! A concurrent key-value map.
//!
//! A thin wrapper around a read/write-locked hash map. Wrapping keeps the
//! rest of the crate independent from the concrete map implementation.

use std::hash::Hash;

use ahash::AHashMap;
use parking_lot::RwLock;

/// A hash map safe for concurrent access from multiple threads.
pub struct ConcurrentMap<K, V> {
    storage: RwLock<AHashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> ConcurrentMap<K, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        ConcurrentMap {
            storage: RwLock::new(AHashMap::new()),
        }
    }

    /// Insert or replace the value for `key`.
    pub fn insert(&self, key: K, value: V) {
        self.storage.write().insert(key, value);
    }

    /// Clone out the value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<V> {
        self.storage.read().get(key).cloned()
    }

    /// Remove the value for `key`, returning it if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.storage.write().remove(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.storage.read().contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.read().is_empty()
    }

    /// Insert `value` only when `key` is absent. Returns the resident value.
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> V {
        let mut storage = self.storage.write();
        storage.entry(key).or_insert_with(make).clone()
    }

    /// Remove the value for `key` only when the predicate approves the
    /// resident value. Returns the removed value.
    pub fn remove_if(&self, key: &K, predicate: impl FnOnce(&V) -> bool) -> Option<V> {
        let mut storage = self.storage.write();
        if storage.get(key).is_some_and(predicate) {
            return storage.remove(key);
        }
        None
    }

    /// Replace the value for `key` only when the key is present. Returns
    /// whether a replacement happened.
    pub fn replace_if_present(&self, key: &K, value: V) -> bool {
        let mut storage = self.storage.write();
        match storage.get_mut(key) {
            Some(resident) => {
                *resident = value;
                true
            }
            None => false,
        }
    }
}

impl<K: Eq + Hash, V: Clone> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for ConcurrentMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentMap").finish()
    }
}
