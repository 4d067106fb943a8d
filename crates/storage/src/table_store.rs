//! TableStore: committed state for the three tables
//!
//! This module implements the Storage trait using:
//! - `BTreeMap<Key, VersionedValue>` per register table (lww, append)
//! - `BTreeMap<RowId, SetMember>` for the growable set, plus a [`KeyIndex`]
//! - one `parking_lot::RwLock` over all tables, so a batch is installed
//!   under a single write lock acquisition
//! - `AtomicU64` for the current version and the largest set-member id
//!
//! # Design Notes
//!
//! - **No version history**: each row stores only its latest value
//! - **Validate, then mutate**: `apply_batch` checks every insert for an id
//!   collision before touching any table, so a rejected batch leaves no trace

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use mopstore_core::{
    Key, Row, RowId, Storage, StoreError, StoreResult, TableKind, Value, VersionedValue, Write,
};

use crate::index::KeyIndex;

/// A committed growable-set member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMember {
    /// Set key
    pub key: Key,
    /// Member value
    pub value: Value,
    /// Commit version that inserted the member
    pub version: u64,
}

#[derive(Debug, Default)]
struct Tables {
    lww: BTreeMap<Key, VersionedValue>,
    append: BTreeMap<Key, VersionedValue>,
    set: BTreeMap<RowId, SetMember>,
    set_index: KeyIndex,
}

impl Tables {
    fn register(&self, table: TableKind) -> Option<&BTreeMap<Key, VersionedValue>> {
        match table {
            TableKind::Lww => Some(&self.lww),
            TableKind::Append => Some(&self.append),
            TableKind::Set => None,
        }
    }

    fn register_mut(&mut self, table: TableKind) -> Option<&mut BTreeMap<Key, VersionedValue>> {
        match table {
            TableKind::Lww => Some(&mut self.lww),
            TableKind::Append => Some(&mut self.append),
            TableKind::Set => None,
        }
    }
}

/// In-memory committed state for the lww, append and set tables
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`.
#[derive(Debug, Default)]
pub struct TableStore {
    tables: RwLock<Tables>,
    /// Version of the most recently applied batch
    version: AtomicU64,
    /// Largest set-member id ever applied
    max_row_id: AtomicU64,
}

impl TableStore {
    /// Create a new empty TableStore (version 0, no rows)
    pub fn new() -> Self {
        Self::default()
    }

    fn check_inserts(tables: &Tables, writes: &[Write]) -> StoreResult<()> {
        let mut seen: FxHashSet<RowId> = FxHashSet::default();
        for write in writes {
            match write {
                Write::Insert { id, .. } => {
                    if tables.set.contains_key(id) || !seen.insert(*id) {
                        return Err(StoreError::constraint(format!(
                            "duplicate set member id {}",
                            id
                        )));
                    }
                }
                Write::Put { table, .. } => {
                    if !table.is_register() {
                        return Err(StoreError::invalid_input(format!(
                            "put targets non-register table '{}'",
                            table
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Storage for TableStore {
    fn get(&self, table: TableKind, key: Key) -> StoreResult<Option<VersionedValue>> {
        let tables = self.tables.read();
        if let Some(register) = tables.register(table) {
            return Ok(register.get(&key).cloned());
        }

        let Some(ids) = tables.set_index.get(key) else {
            return Ok(None);
        };
        let mut values = Vec::with_capacity(ids.len());
        let mut version = 0;
        for member in ids.iter().filter_map(|id| tables.set.get(id)) {
            values.push(member.value.clone());
            version = version.max(member.version);
        }
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(VersionedValue::new(Value::List(values), version)))
    }

    fn members(&self, key: Key) -> StoreResult<Vec<(RowId, VersionedValue)>> {
        let tables = self.tables.read();
        Ok(match tables.set_index.get(key) {
            Some(ids) => ids
                .iter()
                .filter_map(|id| {
                    tables
                        .set
                        .get(id)
                        .map(|m| (*id, VersionedValue::new(m.value.clone(), m.version)))
                })
                .collect(),
            None => Vec::new(),
        })
    }

    fn scan(&self, table: TableKind) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read();
        if let Some(register) = tables.register(table) {
            return Ok(register
                .iter()
                .map(|(k, vv)| Row {
                    k: *k,
                    id: None,
                    v: vv.value.clone(),
                    version: vv.version,
                })
                .collect());
        }

        let mut rows: Vec<Row> = tables
            .set
            .iter()
            .map(|(id, m)| Row {
                k: m.key,
                id: Some(*id),
                v: m.value.clone(),
                version: m.version,
            })
            .collect();
        rows.sort_by_key(|r| (r.k, r.id));
        Ok(rows)
    }

    fn contains_member(&self, id: RowId) -> bool {
        self.tables.read().set.contains_key(&id)
    }

    fn row_count(&self, table: TableKind) -> usize {
        let tables = self.tables.read();
        match tables.register(table) {
            Some(register) => register.len(),
            None => tables.set.len(),
        }
    }

    fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn max_row_id(&self) -> RowId {
        self.max_row_id.load(Ordering::SeqCst)
    }

    fn apply_batch(&self, writes: &[Write], version: u64) -> StoreResult<()> {
        let mut tables = self.tables.write();
        Self::check_inserts(&tables, writes)?;

        let mut max_id = 0;
        for write in writes {
            match write {
                Write::Put { table, key, value } => {
                    if let Some(register) = tables.register_mut(*table) {
                        register.insert(*key, VersionedValue::new(value.clone(), version));
                    }
                }
                Write::Insert { id, key, value } => {
                    tables.set.insert(
                        *id,
                        SetMember {
                            key: *key,
                            value: value.clone(),
                            version,
                        },
                    );
                    tables.set_index.insert(*key, *id);
                    max_id = max_id.max(*id);
                }
            }
        }

        // Ensure current_version() reflects the max version in the store
        self.version.fetch_max(version, Ordering::SeqCst);
        self.max_row_id.fetch_max(max_id, Ordering::SeqCst);
        Ok(())
    }
}
