//! Exclusive writer lock with a busy timeout
//!
//! Every transaction holds the database's writer lock from begin until
//! commit or abort, so transactions execute one at a time. Acquisition waits
//! at most the configured busy timeout and then fails with
//! [`StoreError::Busy`].
//!
//! The lock is handed out as an owned [`WriterPermit`] (not a borrowed
//! guard) so a `TransactionContext` can carry it without a lifetime. The
//! permit releases the lock when dropped.

use mopstore_core::{StoreError, StoreResult};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Database-wide writer lock
#[derive(Debug, Default)]
pub struct WriterLock {
    /// Transaction currently holding the lock
    holder: Mutex<Option<u64>>,
    released: Condvar,
}

impl WriterLock {
    /// Create an unlocked writer lock
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Acquire the lock for `txn_id`, waiting at most `timeout`
    ///
    /// A zero timeout tries exactly once.
    pub fn acquire(self: &Arc<Self>, txn_id: u64, timeout: Duration) -> StoreResult<WriterPermit> {
        let deadline = Instant::now() + timeout;
        let mut holder = self.holder.lock();

        while holder.is_some() {
            if self.released.wait_until(&mut holder, deadline).timed_out() && holder.is_some() {
                return Err(StoreError::busy(timeout.as_millis() as u64));
            }
        }

        *holder = Some(txn_id);
        Ok(WriterPermit {
            lock: Arc::clone(self),
            txn_id,
        })
    }

    /// Transaction currently holding the lock, if any
    pub fn holder(&self) -> Option<u64> {
        *self.holder.lock()
    }

    fn release(&self, txn_id: u64) {
        let mut holder = self.holder.lock();
        if *holder == Some(txn_id) {
            *holder = None;
            self.released.notify_one();
        }
    }
}

/// Proof of holding the writer lock; releases it on drop
#[derive(Debug)]
pub struct WriterPermit {
    lock: Arc<WriterLock>,
    txn_id: u64,
}

impl WriterPermit {
    /// Transaction the permit was issued to
    pub fn txn_id(&self) -> u64 {
        self.txn_id
    }
}

impl Drop for WriterPermit {
    fn drop(&mut self) {
        self.lock.release(self.txn_id);
    }
}
