//! Recovery coordinator
//!
//! Rebuilds committed state from the WAL on open:
//!
//! 1. Open the WAL (a torn tail is truncated)
//! 2. Replay committed transactions into a fresh `TableStore`, in commit order
//! 3. Discard incomplete and aborted transactions
//! 4. Initialize the `TransactionManager` with the recovered version and
//!    the highest transaction id in the log
//!
//! Replay applies commit decisions; it never re-executes micro-operations.

use crate::TransactionManager;
use mopstore_core::StoreResult;
use mopstore_durability::{replay_wal, DurabilityMode, WAL};
use mopstore_storage::TableStore;
use std::path::PathBuf;
use tracing::info;

/// Coordinates database recovery after crash or restart
pub struct RecoveryCoordinator {
    /// Path to WAL file
    wal_path: PathBuf,
}

impl RecoveryCoordinator {
    /// Create a new recovery coordinator for the WAL at `wal_path`
    pub fn new(wal_path: PathBuf) -> Self {
        RecoveryCoordinator { wal_path }
    }

    /// Perform recovery and return initialized components
    ///
    /// A missing WAL file is created empty and yields an empty store at
    /// version 0. Replaying the same WAL always produces identical state.
    ///
    /// # Errors
    ///
    /// Fails if the WAL cannot be opened or contains a corrupt entry before
    /// its tail.
    pub fn recover(&self) -> StoreResult<RecoveryResult> {
        // Mode is irrelevant here: recovery only reads
        let wal = WAL::open(&self.wal_path, DurabilityMode::None)?;
        let storage = TableStore::new();

        let replay = replay_wal(&wal, &storage)?;

        let txn_manager = TransactionManager::with_txn_id(replay.final_version, replay.max_txn_id);

        let stats = RecoveryStats {
            txns_replayed: replay.txns_applied,
            incomplete_txns: replay.incomplete_txns,
            aborted_txns: replay.aborted_txns,
            puts_applied: replay.puts_applied,
            inserts_applied: replay.inserts_applied,
            final_version: replay.final_version,
            max_txn_id: replay.max_txn_id,
        };

        info!(
            target: "mopstore::recovery",
            path = %self.wal_path.display(),
            txns_replayed = stats.txns_replayed,
            incomplete_txns = stats.incomplete_txns,
            final_version = stats.final_version,
            "Recovery complete"
        );

        Ok(RecoveryResult {
            storage,
            txn_manager,
            stats,
        })
    }
}

/// Result of recovery operation
pub struct RecoveryResult {
    /// Recovered storage with all committed transactions applied
    pub storage: TableStore,
    /// Transaction manager continuing from the recovered version
    pub txn_manager: TransactionManager,
    /// Statistics about the recovery process
    pub stats: RecoveryStats,
}

/// Statistics from recovery
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Number of committed transactions replayed
    pub txns_replayed: usize,

    /// Number of incomplete transactions discarded
    ///
    /// BeginTxn without CommitTxn: the process stopped mid-commit.
    pub incomplete_txns: usize,

    /// Number of aborted transactions discarded
    pub aborted_txns: usize,

    /// Number of register writes applied
    pub puts_applied: usize,

    /// Number of set-member inserts applied
    pub inserts_applied: usize,

    /// Highest commit version in the WAL
    pub final_version: u64,

    /// Highest transaction id in the WAL
    pub max_txn_id: u64,
}

impl RecoveryStats {
    /// Total operations applied (puts + inserts)
    pub fn total_operations(&self) -> usize {
        self.puts_applied + self.inserts_applied
    }

    /// Total transactions found (replayed + incomplete + aborted)
    pub fn total_transactions(&self) -> usize {
        self.txns_replayed + self.incomplete_txns + self.aborted_txns
    }
}
