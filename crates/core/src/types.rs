//! Core identity and row types
//!
//! - [`Key`]: logical record key (integer)
//! - [`RowId`]: identity of a growable-set member
//! - [`TableKind`]: which logical table (and therefore which merge policy) a batch targets
//! - [`Write`]: one buffered mutation, as logged in the WAL and applied to storage
//! - [`Row`]: a committed row as seen by `list`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;
use crate::policy::MergePolicy;
use crate::value::Value;

/// Logical record key
pub type Key = i64;

/// Identity of a growable-set member (unique across the whole set table)
pub type RowId = u64;

/// The three logical tables
///
/// Each table has exactly one merge policy; a batch targets exactly one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Last-writer-wins overwrite register
    Lww,
    /// Last-writer-wins append/merge register
    Append,
    /// Insert-only growable set
    Set,
}

impl TableKind {
    /// All tables, in a stable order
    pub const ALL: [TableKind; 3] = [TableKind::Lww, TableKind::Append, TableKind::Set];

    /// Table name as used on the wire and in the WAL
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Lww => "lww",
            TableKind::Append => "append",
            TableKind::Set => "set",
        }
    }

    /// Merge policy for this table
    pub fn policy(&self) -> MergePolicy {
        match self {
            TableKind::Lww => MergePolicy::Overwrite,
            TableKind::Append => MergePolicy::Append,
            TableKind::Set => MergePolicy::Insert,
        }
    }

    /// True for tables holding at most one row per key
    pub fn is_register(&self) -> bool {
        !matches!(self, TableKind::Set)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lww" => Ok(TableKind::Lww),
            "append" => Ok(TableKind::Append),
            "set" => Ok(TableKind::Set),
            other => Err(StoreError::invalid_input(format!(
                "unknown table '{}', expected one of: lww, append, set",
                other
            ))),
        }
    }
}

/// Value together with the commit version that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// Stored value
    pub value: Value,
    /// Commit version of the atomic unit that last wrote it
    pub version: u64,
}

impl VersionedValue {
    /// Create a new versioned value
    pub fn new(value: Value, version: u64) -> Self {
        Self { value, version }
    }
}

/// A buffered mutation
///
/// Writes are collected by an atomic unit in submission order, logged to the
/// WAL at commit, and then applied to storage under one commit version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Write {
    /// Replace the register row at `key` (insert if absent)
    ///
    /// `value` is the final stored value: merges are resolved before the
    /// write is buffered, so replay never re-runs a merge.
    Put {
        /// Register table (`Lww` or `Append`)
        table: TableKind,
        /// Row key
        key: Key,
        /// Full value to store
        value: Value,
    },
    /// Insert a new growable-set member
    Insert {
        /// Member identity
        id: RowId,
        /// Set key
        key: Key,
        /// Member value
        value: Value,
    },
}

impl Write {
    /// Table this write targets
    pub fn table(&self) -> TableKind {
        match self {
            Write::Put { table, .. } => *table,
            Write::Insert { .. } => TableKind::Set,
        }
    }

    /// Key this write targets
    pub fn key(&self) -> Key {
        match self {
            Write::Put { key, .. } | Write::Insert { key, .. } => *key,
        }
    }
}

/// A committed row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Row key
    pub k: Key,
    /// Member identity (set table only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    /// Stored value
    pub v: Value,
    /// Commit version that last wrote the row
    pub version: u64,
}
