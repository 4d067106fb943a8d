//! Transaction manager for coordinating begin and commit
//!
//! Transactions are serialized by an exclusive writer lock held from begin
//! to commit/abort, so commit needs no conflict validation.
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. mark_committing()          - Active → Committing
//! 2. read-only? → Committed, done (no WAL entries, no new version)
//! 3. allocate commit_version
//! 4. BeginTxn, Put/Insert…      - to WAL
//! 5. CommitTxn                  - to WAL, synced per durability mode (DURABILITY POINT)
//! 6. apply_batch() to storage   - writes become visible as one unit
//! 7. mark_committed()           - releases the writer lock
//! ```
//!
//! If a crash occurs before step 5: the transaction is not durable and is
//! discarded on recovery. After step 5 it is replayed.
//!
//! A WAL failure during steps 4-5 leaves the unit's fate unknown: its commit
//! record may already be on disk. The WAL then refuses every later entry, so
//! no other unit can commit on top of it (or reuse its version or set ids)
//! before the database is reopened and recovery settles the question.

use crate::lock::WriterLock;
use crate::wal_writer::TransactionWALWriter;
use crate::{CommitError, TransactionContext};
use mopstore_core::{Storage, StoreResult};
use mopstore_durability::WAL;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default writer-lock wait before a transaction fails as busy
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Manages transaction lifecycle and atomic commits
pub struct TransactionManager {
    /// Global version counter, incremented once per committed write transaction
    version: AtomicU64,

    /// Next transaction ID
    next_txn_id: AtomicU64,

    /// Exclusive writer lock
    writer_lock: Arc<WriterLock>,

    /// Maximum wait for the writer lock
    busy_timeout: Duration,
}

impl TransactionManager {
    /// Create a new transaction manager
    ///
    /// `initial_version` is typically recovery's final version.
    pub fn new(initial_version: u64) -> Self {
        Self::with_txn_id(initial_version, 0)
    }

    /// Create a new transaction manager with specific starting txn_id
    ///
    /// New transactions start at `max_txn_id + 1` so their ids never collide
    /// with ids already in the WAL.
    pub fn with_txn_id(initial_version: u64, max_txn_id: u64) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(max_txn_id + 1),
            writer_lock: WriterLock::new(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Set the writer-lock busy timeout
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate next commit version
    pub fn allocate_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Writer-lock busy timeout
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    /// Transaction currently holding the writer lock
    pub fn lock_holder(&self) -> Option<u64> {
        self.writer_lock.holder()
    }

    /// Begin a transaction over `storage`
    ///
    /// Waits at most the busy timeout for the writer lock.
    ///
    /// # Errors
    ///
    /// `StoreError::Busy` if the lock could not be acquired in time.
    pub fn begin(&self, storage: Arc<dyn Storage>) -> StoreResult<TransactionContext> {
        self.begin_with_timeout(storage, self.busy_timeout)
    }

    /// Begin a transaction, waiting at most `timeout` for the writer lock
    pub fn begin_with_timeout(
        &self,
        storage: Arc<dyn Storage>,
        timeout: Duration,
    ) -> StoreResult<TransactionContext> {
        let txn_id = self.next_txn_id();
        let permit = self.writer_lock.acquire(txn_id, timeout).map_err(|e| {
            warn!(
                target: "mopstore::txn",
                txn_id,
                timeout_ms = timeout.as_millis() as u64,
                holder = ?self.writer_lock.holder(),
                "Writer lock busy"
            );
            e
        })?;

        debug!(target: "mopstore::txn", txn_id, "Transaction started");
        Ok(TransactionContext::new(txn_id, storage, permit))
    }

    /// Commit a transaction atomically
    ///
    /// `wal` is `None` for in-memory databases. Returns the commit version
    /// (the current version, unchanged, for read-only transactions).
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        wal: Option<&WAL>,
    ) -> Result<u64, CommitError> {
        txn.mark_committing()?;

        if txn.is_read_only() {
            txn.mark_committed()?;
            debug!(target: "mopstore::txn", txn_id = txn.txn_id, "Read-only transaction committed");
            return Ok(self.current_version());
        }

        if let Some(wal) = wal {
            if wal.is_failed() {
                let _ = txn.mark_aborted("WAL is in a failed state".to_string());
                return Err(CommitError::WALError(
                    "an earlier WAL write failed; reopen the database".to_string(),
                ));
            }
        }

        let commit_version = self.allocate_version();

        if let Some(wal) = wal {
            if let Err(e) = Self::write_to_wal(wal, txn, commit_version) {
                error!(
                    target: "mopstore::txn",
                    txn_id = txn.txn_id,
                    commit_version,
                    error = %e,
                    "WAL write failed, transaction outcome unknown until reopen"
                );
                // The version stays allocated: the commit record may be on disk
                let _ = txn.mark_aborted(format!("WAL write failed: {}", e));
                return Err(CommitError::WALError(e.to_string()));
            }
        }

        // DURABILITY POINT passed: recovery will replay this transaction
        if let Err(e) = txn.storage().apply_batch(txn.pending_writes(), commit_version) {
            error!(
                target: "mopstore::txn",
                txn_id = txn.txn_id,
                commit_version,
                error = %e,
                "Storage application failed after WAL commit - will be recovered on restart"
            );
        }

        let writes = txn.write_count();
        txn.mark_committed()?;
        debug!(
            target: "mopstore::txn",
            txn_id = txn.txn_id,
            commit_version,
            writes,
            "Transaction committed"
        );
        Ok(commit_version)
    }

    fn write_to_wal(wal: &WAL, txn: &TransactionContext, commit_version: u64) -> StoreResult<()> {
        let mut writer = TransactionWALWriter::new(wal, txn.txn_id);
        writer.write_begin()?;
        let result = writer
            .write_all(txn.pending_writes(), commit_version)
            .and_then(|_| writer.write_commit());
        if result.is_err() {
            let _ = writer.write_abort();
        }
        result
    }

    /// Explicitly abort a transaction
    ///
    /// Buffered writes are discarded and the writer lock is released. No WAL
    /// entry is written since nothing reached the log.
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) -> StoreResult<()> {
        debug!(target: "mopstore::txn", txn_id = txn.txn_id, %reason, "Transaction aborted");
        txn.mark_aborted(reason)
    }

    /// Commit, making sure the transaction ends aborted on failure
    pub fn commit_or_rollback(
        &self,
        txn: &mut TransactionContext,
        wal: Option<&WAL>,
    ) -> Result<u64, CommitError> {
        match self.commit(txn, wal) {
            Ok(version) => Ok(version),
            Err(e) => {
                if txn.can_rollback() {
                    let _ = txn.mark_aborted(format!("Commit failed: {}", e));
                }
                Err(e)
            }
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}
