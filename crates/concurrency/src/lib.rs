//! Transaction layer for mopstore
//!
//! This crate serializes transactions through a database-wide writer lock:
//! - WriterLock: exclusive lock with a busy timeout
//! - TransactionContext: buffered writes, read-your-own-writes, set-id allocation
//! - TransactionManager: begin, commit protocol, abort
//! - TransactionWALWriter: WAL entries for one commit
//! - RecoveryCoordinator: WAL replay on open

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lock;
pub mod manager;
pub mod recovery;
pub mod transaction;
pub mod wal_writer;

pub use lock::{WriterLock, WriterPermit};
pub use manager::{TransactionManager, DEFAULT_BUSY_TIMEOUT};
pub use recovery::{RecoveryCoordinator, RecoveryResult, RecoveryStats};
pub use transaction::{CommitError, PendingOperations, TransactionContext, TransactionStatus};
pub use wal_writer::TransactionWALWriter;
