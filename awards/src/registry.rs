//! Registry of events waiting for resolution
//!
//! One entry per key. Removal is the claim: whichever caller removes an entry
//! owns it, and everyone else sees `None`.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Concurrent map of open events
#[derive(Debug)]
pub struct ActiveRegistry<K, V>
where
    K: Eq + Hash,
{
    entries: Arc<DashMap<K, V>>,
}

impl<K: Eq + Hash, V> Clone for ActiveRegistry<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K: Eq + Hash, V> Default for ActiveRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> ActiveRegistry<K, V> {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Insert unless the key is already open. Returns whether it was inserted.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Remove and return the entry
    pub fn take(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    /// Remove and return the entry only if `predicate` holds for it
    pub fn take_if(&self, key: &K, predicate: impl FnOnce(&V) -> bool) -> Option<V> {
        self.entries
            .remove_if(key, |_, value| predicate(value))
            .map(|(_, value)| value)
    }

    /// Whether the key is open
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of open entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is open
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> ActiveRegistry<K, V> {
    /// Copy of the entry, left in place
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }
}
