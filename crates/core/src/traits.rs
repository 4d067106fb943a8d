//! Core storage abstraction
//!
//! The [`Storage`] trait describes committed state only. Uncommitted writes
//! live in a transaction's buffer and reach storage through
//! [`Storage::apply_batch`] once the commit record is durable.

use crate::error::StoreResult;
use crate::types::{Key, Row, RowId, TableKind, VersionedValue, Write};

/// Committed-state storage for the three tables
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Storage: Send + Sync {
    /// Current value for `key` in `table`
    ///
    /// For the set table the value is the list of member values ordered by
    /// id, and the version is that of the newest member. Returns `None` when
    /// the key has no row (or no members).
    fn get(&self, table: TableKind, key: Key) -> StoreResult<Option<VersionedValue>>;

    /// Committed members of the set at `key`, ordered by id
    fn members(&self, key: Key) -> StoreResult<Vec<(RowId, VersionedValue)>>;

    /// Every row of `table`, ordered by key (and id for the set table)
    fn scan(&self, table: TableKind) -> StoreResult<Vec<Row>>;

    /// True if a set member with this id has been committed
    fn contains_member(&self, id: RowId) -> bool;

    /// Number of committed rows in `table`
    fn row_count(&self, table: TableKind) -> usize;

    /// Version of the most recently applied batch (0 when empty)
    fn current_version(&self) -> u64;

    /// Largest committed set-member id (0 when none)
    fn max_row_id(&self) -> RowId;

    /// Install every write of one committed unit under `version`
    ///
    /// Readers observe either none or all of `writes`.
    fn apply_batch(&self, writes: &[Write], version: u64) -> StoreResult<()>;
}
