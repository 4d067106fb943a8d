//! Transaction coordinator for managing transaction lifecycle
//!
//! The TransactionCoordinator wraps TransactionManager and adds:
//! - Active transaction tracking (whoever holds the writer lock)
//! - Transaction metrics (started, committed, aborted, busy)
//! - Conversion of commit failures into `StoreError`

use mopstore_concurrency::{TransactionContext, TransactionManager};
use mopstore_core::{Storage, StoreError, StoreResult};
use mopstore_durability::WAL;
use mopstore_storage::TableStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Transaction coordinator for the database
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering: they are observational only and
/// do not synchronize any other memory operations.
pub struct TransactionCoordinator {
    /// Transaction manager for ID/version allocation and the writer lock
    manager: TransactionManager,
    /// Total transactions started
    total_started: AtomicU64,
    /// Total transactions committed
    total_committed: AtomicU64,
    /// Total transactions aborted
    total_aborted: AtomicU64,
    /// Begin attempts that timed out on the writer lock
    total_busy: AtomicU64,
}

impl TransactionCoordinator {
    /// Create new coordinator with initial version and busy timeout
    pub fn new(initial_version: u64, busy_timeout: Duration) -> Self {
        Self::from_manager(TransactionManager::new(initial_version).with_busy_timeout(busy_timeout))
    }

    /// Create coordinator around an existing manager
    ///
    /// Used after recovery so version and txn id continuity are preserved.
    pub fn from_manager(manager: TransactionManager) -> Self {
        Self {
            manager,
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
            total_busy: AtomicU64::new(0),
        }
    }

    /// Start a new transaction, waiting at most `timeout` for the writer lock
    ///
    /// # Errors
    ///
    /// `StoreError::Busy` if the lock is held past the timeout.
    pub fn start_transaction(
        &self,
        storage: &Arc<TableStore>,
        timeout: Duration,
    ) -> StoreResult<TransactionContext> {
        let storage = Arc::clone(storage) as Arc<dyn Storage>;
        match self.manager.begin_with_timeout(storage, timeout) {
            Ok(txn) => {
                self.record_start();
                Ok(txn)
            }
            Err(e) => {
                if e.is_busy() {
                    self.total_busy.fetch_add(1, Ordering::Relaxed);
                }
                Err(e)
            }
        }
    }

    /// Commit a transaction through the concurrency layer
    ///
    /// `wal` is `None` for databases without a WAL.
    ///
    /// # Returns
    /// * `Ok(commit_version)` - Transaction committed successfully
    /// * `Err(StoreError)` - WAL error or invalid state; the transaction is aborted
    pub fn commit(&self, txn: &mut TransactionContext, wal: Option<&WAL>) -> StoreResult<u64> {
        match self.manager.commit_or_rollback(txn, wal) {
            Ok(version) => {
                self.record_commit();
                Ok(version)
            }
            Err(e) => {
                self.record_abort();
                warn!(target: "mopstore::txn", txn_id = txn.txn_id, error = %e, "Transaction aborted");
                Err(StoreError::from(e))
            }
        }
    }

    /// Abort a transaction, discarding its buffered writes
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) -> StoreResult<()> {
        let result = self.manager.abort(txn, reason);
        self.record_abort();
        result
    }

    fn record_start(&self) {
        self.total_started.fetch_add(1, Ordering::Relaxed);
    }

    fn record_commit(&self) {
        self.total_committed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_abort(&self) {
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.manager.current_version()
    }

    /// Default writer-lock busy timeout
    pub fn busy_timeout(&self) -> Duration {
        self.manager.busy_timeout()
    }

    /// Get transaction metrics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count(),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            total_busy: self.total_busy.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }

    /// Get current active transaction count
    ///
    /// A transaction is active while it holds the writer lock, so this is 0
    /// or 1. Contexts dropped without commit or abort release the lock and
    /// stop counting.
    pub fn active_count(&self) -> u64 {
        u64::from(self.manager.lock_holder().is_some())
    }

    /// Wait for the active transaction (if any) to finish
    ///
    /// Returns `false` if `timeout` expired first.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while self.manager.lock_holder().is_some() {
            if start.elapsed() > timeout {
                debug!(target: "mopstore::txn", "Timed out waiting for idle");
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }
}

/// Transaction metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetrics {
    /// Number of currently active transactions
    pub active_count: u64,
    /// Total number of transactions started
    pub total_started: u64,
    /// Total number of transactions committed
    pub total_committed: u64,
    /// Total number of transactions aborted
    pub total_aborted: u64,
    /// Begin attempts that failed as busy
    pub total_busy: u64,
    /// Commit success rate (committed / started)
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Total transactions that completed (committed + aborted)
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_aborted
    }

    /// Abort rate (aborted / started)
    pub fn abort_rate(&self) -> f64 {
        if self.total_started > 0 {
            self.total_aborted as f64 / self.total_started as f64
        } else {
            0.0
        }
    }
}
