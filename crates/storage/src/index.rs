//! Secondary index for the growable set
//!
//! Set members are stored by `RowId`; `KeyIndex` maps each set key to the ids
//! of its members so a read is O(members) instead of O(table).

use mopstore_core::{Key, RowId};
use std::collections::{BTreeMap, BTreeSet};

/// Secondary index: Key → member RowIds (ordered)
#[derive(Debug, Default)]
pub struct KeyIndex {
    index: BTreeMap<Key, BTreeSet<RowId>>,
}

impl KeyIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that member `id` belongs to `key`
    pub fn insert(&mut self, key: Key, id: RowId) {
        self.index.entry(key).or_default().insert(id);
    }

    /// Member ids of `key`, ascending
    pub fn get(&self, key: Key) -> Option<&BTreeSet<RowId>> {
        self.index.get(&key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
