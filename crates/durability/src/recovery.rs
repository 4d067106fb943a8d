//! WAL Replay Logic for Recovery
//!
//! Scans WAL entries, groups them by transaction ID, and applies only
//! committed transactions to storage.
//!
//! ## Replay Process
//!
//! 1. Scan WAL entries from the beginning
//! 2. Group entries by txn_id
//! 3. Apply each transaction when its CommitTxn is reached (commit order)
//! 4. Discard aborted and incomplete transactions (BeginTxn without CommitTxn)
//!
//! An AbortTxn anywhere in the log wins over a CommitTxn for the same
//! transaction: the commit record reached the log but the writer gave up on
//! the unit, and the live process never installed it.
//! 5. Preserve version numbers from the WAL (no new versions are allocated)

use crate::wal::{WALEntry, WAL};
use mopstore_core::{Storage, StoreResult, Write};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

/// Statistics from WAL replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of committed transactions that were applied
    pub txns_applied: usize,
    /// Number of register writes applied
    pub puts_applied: usize,
    /// Number of set-member inserts applied
    pub inserts_applied: usize,
    /// Highest commit version seen in applied transactions
    pub final_version: u64,
    /// Highest transaction id seen anywhere in the WAL
    pub max_txn_id: u64,
    /// Number of incomplete transactions discarded (no CommitTxn)
    pub incomplete_txns: usize,
    /// Number of aborted transactions discarded
    pub aborted_txns: usize,
    /// Number of data entries without a preceding BeginTxn
    pub orphaned_entries: usize,
}

#[derive(Debug, Default)]
struct PendingTxn {
    writes: Vec<Write>,
    version: u64,
}

/// Replay the WAL into `storage`
///
/// Returns statistics about the replay. Storage is expected to be empty.
pub fn replay_wal<S: Storage + ?Sized>(wal: &WAL, storage: &S) -> StoreResult<ReplayStats> {
    let entries = wal.read_all()?;
    let aborted: FxHashSet<u64> = entries
        .iter()
        .filter_map(|entry| match entry {
            WALEntry::AbortTxn { txn_id } => Some(*txn_id),
            _ => None,
        })
        .collect();

    let mut pending: FxHashMap<u64, PendingTxn> = FxHashMap::default();
    let mut stats = ReplayStats::default();

    for entry in entries {
        stats.max_txn_id = stats.max_txn_id.max(entry.txn_id());

        match entry {
            WALEntry::BeginTxn { txn_id, .. } => {
                pending.insert(txn_id, PendingTxn::default());
            }
            WALEntry::Put {
                txn_id,
                table,
                key,
                value,
                version,
            } => match pending.get_mut(&txn_id) {
                Some(txn) => {
                    txn.writes.push(Write::Put { table, key, value });
                    txn.version = txn.version.max(version);
                }
                None => stats.orphaned_entries += 1,
            },
            WALEntry::Insert {
                txn_id,
                id,
                key,
                value,
                version,
            } => match pending.get_mut(&txn_id) {
                Some(txn) => {
                    txn.writes.push(Write::Insert { id, key, value });
                    txn.version = txn.version.max(version);
                }
                None => stats.orphaned_entries += 1,
            },
            WALEntry::CommitTxn { txn_id } => {
                if let Some(txn) = pending.remove(&txn_id) {
                    if aborted.contains(&txn_id) {
                        stats.aborted_txns += 1;
                    } else {
                        apply_transaction(storage, txn, &mut stats)?;
                    }
                }
            }
            WALEntry::AbortTxn { txn_id } => {
                if pending.remove(&txn_id).is_some() {
                    stats.aborted_txns += 1;
                }
            }
        }
    }

    stats.incomplete_txns = pending.len();
    if stats.incomplete_txns > 0 || stats.orphaned_entries > 0 {
        warn!(
            target: "mopstore::recovery",
            incomplete_txns = stats.incomplete_txns,
            orphaned_entries = stats.orphaned_entries,
            "Discarded uncommitted WAL entries"
        );
    }

    info!(
        target: "mopstore::recovery",
        txns_applied = stats.txns_applied,
        aborted_txns = stats.aborted_txns,
        final_version = stats.final_version,
        "WAL replay complete"
    );

    Ok(stats)
}

fn apply_transaction<S: Storage + ?Sized>(
    storage: &S,
    txn: PendingTxn,
    stats: &mut ReplayStats,
) -> StoreResult<()> {
    for write in &txn.writes {
        match write {
            Write::Put { .. } => stats.puts_applied += 1,
            Write::Insert { .. } => stats.inserts_applied += 1,
        }
    }

    if !txn.writes.is_empty() {
        storage.apply_batch(&txn.writes, txn.version)?;
    }

    stats.final_version = stats.final_version.max(txn.version);
    stats.txns_applied += 1;
    Ok(())
}
