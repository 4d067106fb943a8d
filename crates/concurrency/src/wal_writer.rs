//! WAL writer for transactions
//!
//! Writes one transaction's entries to the WAL during commit:
//! - BeginTxn first
//! - one Put / Insert per buffered write, all carrying the commit version
//! - CommitTxn last (the durability point)
//!
//! ```ignore
//! let mut writer = TransactionWALWriter::new(&wal, txn_id);
//! writer.write_begin()?;
//! writer.write_all(txn.pending_writes(), commit_version)?;
//! writer.write_commit()?;
//! ```

use chrono::Utc;
use mopstore_core::{StoreResult, Write};
use mopstore_durability::{WALEntry, WAL};

/// Writes transaction operations to WAL
pub struct TransactionWALWriter<'a> {
    wal: &'a WAL,
    txn_id: u64,
    entries_written: usize,
}

impl<'a> TransactionWALWriter<'a> {
    /// Create a new WAL writer for a transaction
    pub fn new(wal: &'a WAL, txn_id: u64) -> Self {
        TransactionWALWriter {
            wal,
            txn_id,
            entries_written: 0,
        }
    }

    fn append(&mut self, entry: WALEntry) -> StoreResult<()> {
        self.wal.append(&entry)?;
        self.entries_written += 1;
        Ok(())
    }

    /// Write BeginTxn entry
    pub fn write_begin(&mut self) -> StoreResult<()> {
        self.append(WALEntry::BeginTxn {
            txn_id: self.txn_id,
            timestamp: Utc::now().timestamp_micros(),
        })
    }

    /// Write one buffered write under `version`
    pub fn write(&mut self, write: &Write, version: u64) -> StoreResult<()> {
        let entry = match write {
            Write::Put { table, key, value } => WALEntry::Put {
                txn_id: self.txn_id,
                table: *table,
                key: *key,
                value: value.clone(),
                version,
            },
            Write::Insert { id, key, value } => WALEntry::Insert {
                txn_id: self.txn_id,
                id: *id,
                key: *key,
                value: value.clone(),
                version,
            },
        };
        self.append(entry)
    }

    /// Write every buffered write under `version`, in order
    pub fn write_all(&mut self, writes: &[Write], version: u64) -> StoreResult<()> {
        for write in writes {
            self.write(write, version)?;
        }
        Ok(())
    }

    /// Write CommitTxn entry (marks transaction as durable)
    ///
    /// The WAL syncs according to its durability mode before returning.
    pub fn write_commit(&mut self) -> StoreResult<()> {
        self.append(WALEntry::CommitTxn {
            txn_id: self.txn_id,
        })
    }

    /// Write AbortTxn entry
    ///
    /// Used when a commit fails after BeginTxn reached the log, so replay
    /// can tell an abandoned unit from a crash.
    pub fn write_abort(&mut self) -> StoreResult<()> {
        self.append(WALEntry::AbortTxn {
            txn_id: self.txn_id,
        })
    }

    /// Number of entries written so far
    pub fn entries_written(&self) -> usize {
        self.entries_written
    }
}
