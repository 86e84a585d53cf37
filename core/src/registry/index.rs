//! Swap-remove index
//!
//! Membership list with O(1) insert, lookup and removal. Removal moves the last
//! element into the freed slot, so iteration order is not preserved across removals
//! and nothing may rely on it.

use std::collections::HashMap;
use std::hash::Hash;
use serde::{Serialize, Deserialize};

/// Unordered set of keys backed by a dense array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Eq + Hash",
    deserialize = "K: Deserialize<'de> + Eq + Hash"
))]
pub struct SwapIndex<K: Copy + Eq + Hash> {
    items: Vec<K>,
    positions: HashMap<K, usize>,
}

impl<K: Copy + Eq + Hash> Default for SwapIndex<K> {
    fn default() -> Self {
        SwapIndex {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> SwapIndex<K> {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key; returns false if it was already present
    pub fn insert(&mut self, key: K) -> bool {
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key, self.items.len());
        self.items.push(key);
        true
    }

    /// Remove a key by swapping the last element into its slot
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(position) = self.positions.remove(key) else {
            return false;
        };

        self.items.swap_remove(position);
        if let Some(moved) = self.items.get(position) {
            self.positions.insert(*moved, position);
        }
        true
    }

    /// Whether the key is present
    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys in storage order
    pub fn as_slice(&self) -> &[K] {
        &self.items
    }
}
