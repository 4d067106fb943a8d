//! Transaction context
//!
//! A `TransactionContext` is one atomic unit. It holds the database writer
//! lock for its whole life, buffers every write, and answers reads from its
//! own buffer first (read-your-own-writes) and from committed storage second.
//! Nothing it writes is visible to anyone else until the manager commits it.
//!
//! State transitions:
//! - `Active` → `Committing` (commit begins)
//! - `Committing` → `Committed` (commit record durable, writes installed)
//! - `Committing` → `Aborted` (WAL failure)
//! - `Active` → `Aborted` (explicit abort or operation failure)

use crate::lock::WriterPermit;
use mopstore_core::{
    Key, MergePolicy, RowId, Storage, StoreError, StoreResult, TableKind, Value, Write,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error type for commit failures
#[derive(Debug, Clone, Error)]
pub enum CommitError {
    /// Transaction was not in correct state for commit
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// WAL write failed before the commit record was durable
    #[error("WAL error: {0}")]
    WALError(String),
}

impl From<CommitError> for StoreError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::InvalidState(state) => StoreError::TransactionNotActive {
                txn_id: 0,
                state,
            },
            CommitError::WALError(msg) => StoreError::storage(format!("WAL error: {}", msg)),
        }
    }
}

/// Status of a transaction in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Commit protocol is running
    Committing,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Active => write!(f, "Active"),
            TransactionStatus::Committing => write!(f, "Committing"),
            TransactionStatus::Committed => write!(f, "Committed"),
            TransactionStatus::Aborted { reason } => write!(f, "Aborted ({})", reason),
        }
    }
}

/// Summary of buffered operations that an abort would discard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperations {
    /// Buffered register writes
    pub puts: usize,
    /// Buffered set-member inserts
    pub inserts: usize,
}

impl PendingOperations {
    /// Total number of pending operations
    pub fn total(&self) -> usize {
        self.puts + self.inserts
    }

    /// Check if there are no pending operations
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// One atomic unit of work
pub struct TransactionContext {
    /// Transaction identifier, used in WAL entries
    pub txn_id: u64,
    /// Committed version when the transaction began
    pub start_version: u64,
    /// Lifecycle state
    pub status: TransactionStatus,

    storage: Arc<dyn Storage>,
    permit: Option<WriterPermit>,

    /// Writes in submission order
    writes: Vec<Write>,
    /// Latest buffered value per register row
    register_overlay: FxHashMap<(TableKind, Key), Value>,
    /// Buffered set members per key
    set_overlay: FxHashMap<Key, Vec<(RowId, Value)>>,
    /// Ids inserted by this transaction
    pending_ids: FxHashSet<RowId>,
    /// Next id handed out when an insert does not name one
    next_row_id: RowId,

    read_count: usize,
    start_time: Instant,
}

impl fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("start_version", &self.start_version)
            .field("status", &self.status)
            .field("writes", &self.writes.len())
            .field("holds_lock", &self.permit.is_some())
            .finish()
    }
}

impl TransactionContext {
    /// Create a transaction over `storage`, holding `permit`
    pub fn new(txn_id: u64, storage: Arc<dyn Storage>, permit: WriterPermit) -> Self {
        let start_version = storage.current_version();
        let next_row_id = storage.max_row_id().saturating_add(1);
        Self {
            txn_id,
            start_version,
            status: TransactionStatus::Active,
            storage,
            permit: Some(permit),
            writes: Vec::new(),
            register_overlay: FxHashMap::default(),
            set_overlay: FxHashMap::default(),
            pending_ids: FxHashSet::default(),
            next_row_id,
            read_count: 0,
            start_time: Instant::now(),
        }
    }

    // === Operations ===

    /// Current value of `key` in `table`, including this transaction's writes
    ///
    /// For the set table the value is the list of member values ordered by
    /// id; `None` when the key has no members.
    pub fn get(&mut self, table: TableKind, key: Key) -> StoreResult<Option<Value>> {
        self.ensure_active()?;
        self.read_count += 1;
        self.lookup(table, key)
    }

    fn lookup(&self, table: TableKind, key: Key) -> StoreResult<Option<Value>> {
        if table.is_register() {
            if let Some(v) = self.register_overlay.get(&(table, key)) {
                return Ok(Some(v.clone()));
            }
            return Ok(self.storage.get(table, key)?.map(|vv| vv.value));
        }

        let mut members: Vec<(RowId, Value)> = self
            .storage
            .members(key)?
            .into_iter()
            .map(|(id, vv)| (id, vv.value))
            .collect();
        if let Some(buffered) = self.set_overlay.get(&key) {
            members.extend(buffered.iter().cloned());
            members.sort_by_key(|(id, _)| *id);
        }

        if members.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Value::List(
                members.into_iter().map(|(_, v)| v).collect(),
            )))
        }
    }

    /// Replace the register row at `key` (insert if absent)
    ///
    /// `table` must merge by overwrite. Returns the number of affected rows.
    pub fn put_overwrite(&mut self, table: TableKind, key: Key, value: Value) -> StoreResult<usize> {
        self.ensure_policy(table, MergePolicy::Overwrite)?;
        self.upsert(table, key, value)
    }

    /// Merge `token` onto the register row at `key` (insert if absent)
    ///
    /// `table` must merge by append. Returns the number of affected rows.
    pub fn put_merge(&mut self, table: TableKind, key: Key, token: Value) -> StoreResult<usize> {
        self.ensure_policy(table, MergePolicy::Append)?;
        self.upsert(table, key, token)
    }

    /// Insert a new member into the set at `key`
    ///
    /// With an explicit `id`, a collision with a committed member or with a
    /// member inserted earlier in this transaction is a constraint failure.
    /// Without one, the next free id is allocated. Returns the member id.
    ///
    /// `u64::MAX` is never handed out or accepted: the allocator needs a
    /// successor for every id it has seen.
    pub fn insert_set_member(
        &mut self,
        table: TableKind,
        id: Option<RowId>,
        key: Key,
        value: Value,
    ) -> StoreResult<RowId> {
        self.ensure_policy(table, MergePolicy::Insert)?;

        let id = match id {
            Some(id) => {
                if self.pending_ids.contains(&id) || self.storage.contains_member(id) {
                    return Err(StoreError::constraint(format!(
                        "duplicate set member id {}",
                        id
                    )));
                }
                self.next_row_id = self.next_row_id.max(id_after(id)?);
                id
            }
            None => {
                let mut candidate = self.next_row_id;
                while self.pending_ids.contains(&candidate)
                    || self.storage.contains_member(candidate)
                {
                    candidate = id_after(candidate)?;
                }
                self.next_row_id = id_after(candidate)?;
                candidate
            }
        };

        let value = table.policy().combine(None, &value)?;
        self.pending_ids.insert(id);
        self.set_overlay
            .entry(key)
            .or_default()
            .push((id, value.clone()));
        self.writes.push(Write::Insert { id, key, value });
        Ok(id)
    }

    /// Buffer the table policy's combination of `value` with the current row
    ///
    /// A register holds at most one row per key, so an upsert always affects
    /// exactly one row.
    fn upsert(&mut self, table: TableKind, key: Key, value: Value) -> StoreResult<usize> {
        let policy = table.policy();
        let prior = if policy.reads_prior() {
            self.lookup(table, key)?
        } else {
            None
        };
        let combined = policy.combine(prior.as_ref(), &value)?;
        self.register_overlay.insert((table, key), combined.clone());
        self.writes.push(Write::Put {
            table,
            key,
            value: combined,
        });
        Ok(1)
    }

    fn ensure_policy(&self, table: TableKind, expected: MergePolicy) -> StoreResult<()> {
        self.ensure_active()?;
        let policy = table.policy();
        if policy == expected {
            Ok(())
        } else {
            Err(StoreError::invalid_input(format!(
                "table '{}' merges by {:?}, not {:?}",
                table, policy, expected
            )))
        }
    }

    // === State ===

    /// Check if transaction is active
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Check if transaction is committed
    pub fn is_committed(&self) -> bool {
        self.status == TransactionStatus::Committed
    }

    /// Check if transaction is aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Return an error unless the transaction is active
    pub fn ensure_active(&self) -> StoreResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(StoreError::TransactionNotActive {
                txn_id: self.txn_id,
                state: self.status.to_string(),
            })
        }
    }

    /// Transition `Active` → `Committing`
    pub fn mark_committing(&mut self) -> Result<(), CommitError> {
        if !self.is_active() {
            return Err(CommitError::InvalidState(format!(
                "transaction {} is {}, expected Active",
                self.txn_id, self.status
            )));
        }
        self.status = TransactionStatus::Committing;
        Ok(())
    }

    /// Transition `Committing` → `Committed` and release the writer lock
    pub fn mark_committed(&mut self) -> Result<(), CommitError> {
        if self.status != TransactionStatus::Committing {
            return Err(CommitError::InvalidState(format!(
                "transaction {} is {}, expected Committing",
                self.txn_id, self.status
            )));
        }
        self.status = TransactionStatus::Committed;
        self.permit = None;
        Ok(())
    }

    /// Transition to `Aborted`, discard buffered writes, release the lock
    ///
    /// Fails only if the transaction already committed.
    pub fn mark_aborted(&mut self, reason: String) -> StoreResult<()> {
        if self.is_committed() {
            return Err(StoreError::TransactionNotActive {
                txn_id: self.txn_id,
                state: self.status.to_string(),
            });
        }
        if !self.is_aborted() {
            self.status = TransactionStatus::Aborted { reason };
        }
        self.writes.clear();
        self.register_overlay.clear();
        self.set_overlay.clear();
        self.pending_ids.clear();
        self.permit = None;
        Ok(())
    }

    /// Check if the transaction can still be rolled back
    pub fn can_rollback(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Active | TransactionStatus::Committing
        )
    }

    // === Introspection ===

    /// Buffered writes in submission order
    pub fn pending_writes(&self) -> &[Write] {
        &self.writes
    }

    /// Summary of buffered operations
    pub fn pending_operations(&self) -> PendingOperations {
        let inserts = self
            .writes
            .iter()
            .filter(|w| matches!(w, Write::Insert { .. }))
            .count();
        PendingOperations {
            puts: self.writes.len() - inserts,
            inserts,
        }
    }

    /// Committed storage this transaction reads from
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// True if nothing has been written
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }

    /// Number of reads performed
    pub fn read_count(&self) -> usize {
        self.read_count
    }

    /// Number of buffered writes
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// True while the writer lock is held
    pub fn holds_lock(&self) -> bool {
        self.permit.is_some()
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

fn id_after(id: RowId) -> StoreResult<RowId> {
    id.checked_add(1).ok_or_else(|| {
        StoreError::constraint(format!("set member id {} has no successor", id))
    })
}
