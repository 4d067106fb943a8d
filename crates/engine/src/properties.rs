//! Store properties report
//!
//! A read-only description of an open database, in the spirit of SQL
//! `PRAGMA` queries: where it lives, how it syncs, how it isolates, and how
//! much it holds.

use crate::coordinator::TransactionMetrics;
use mopstore_core::TableKind;
use serde::{Deserialize, Serialize};

/// Journal mode reported for every database
pub const JOURNAL_MODE: &str = "wal";

/// Locking mode: one writer lock serializes every transaction
pub const LOCKING_MODE: &str = "exclusive-writer";

/// Isolation level provided by the writer lock
pub const ISOLATION: &str = "serializable";

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    /// Rows in the `lww` table
    pub lww: usize,
    /// Rows in the `append` table
    pub append: usize,
    /// Members in the `set` table
    pub set: usize,
}

impl RowCounts {
    /// Count for one table
    pub fn get(&self, table: TableKind) -> usize {
        match table {
            TableKind::Lww => self.lww,
            TableKind::Append => self.append,
            TableKind::Set => self.set,
        }
    }

    /// Rows across all tables
    pub fn total(&self) -> usize {
        self.lww + self.append + self.set
    }
}

/// Properties of an open database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreProperties {
    /// Data directory, or `":memory:"` for an ephemeral database
    pub name: String,
    /// Durability mode name
    pub durability: String,
    /// Always `"wal"`
    pub journal_mode: String,
    /// Always `"exclusive-writer"`
    pub locking_mode: String,
    /// Always `"serializable"`
    pub isolation: String,
    /// Writer-lock busy timeout
    pub busy_timeout_ms: u64,
    /// Version of the last committed transaction
    pub current_version: u64,
    /// WAL size in bytes (`None` without a WAL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wal_size_bytes: Option<u64>,
    /// Row counts per table
    pub rows: RowCounts,
    /// Transaction counters
    pub transactions: TransactionMetrics,
}
