//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any test's main.rs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use mopstore::{
    BatchOutcome, Database, DurabilityMode, Error, Executor, Mop, MopResult, MopStoreConfig,
    TableKind, Value,
};
use mopstore_durability::{WAL_DIR, WAL_FILE};
use tempfile::TempDir;

/// Config with fsync at every commit.
pub fn always_config() -> MopStoreConfig {
    MopStoreConfig::with_durability(DurabilityMode::Always)
}

/// WAL location inside a data directory.
pub fn wal_path(data_dir: &Path) -> PathBuf {
    data_dir.join(WAL_DIR).join(WAL_FILE)
}

// ============================================================================
// TestStore - executor over a temporary data directory
// ============================================================================

/// Executor over an on-disk database that can be closed and reopened.
pub struct TestStore {
    pub executor: Option<Executor>,
    pub dir: TempDir,
}

impl TestStore {
    /// Create a store with always durability.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db = Database::open_with_config(dir.path(), always_config())
            .expect("Failed to create test database");
        TestStore {
            executor: Some(Executor::new(db)),
            dir,
        }
    }

    /// Data directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The open executor.
    pub fn executor(&self) -> &Executor {
        self.executor.as_ref().expect("store is closed")
    }

    /// Drop the executor and database, releasing the data directory.
    pub fn close(&mut self) {
        if let Some(executor) = self.executor.take() {
            executor.database().shutdown().expect("shutdown failed");
        }
    }

    /// Close and reopen from the data directory.
    pub fn reopen(&mut self) {
        self.close();
        let db = Database::open(self.dir.path()).expect("Failed to reopen database");
        self.executor = Some(Executor::new(db));
    }
}

// ============================================================================
// Batch helpers
// ============================================================================

/// In-memory executor.
pub fn memory_executor() -> Executor {
    Executor::new(Database::ephemeral())
}

/// Run a batch and require `ok`.
pub fn run_ok(executor: &Executor, table: TableKind, ops: &[Mop]) -> Vec<MopResult> {
    match executor.execute_batch(table, ops).expect("validation failed") {
        BatchOutcome::Ok { value } => value,
        BatchOutcome::Info { error } => panic!("Expected ok, got info: {}", error),
    }
}

/// Run a batch and require `info`.
pub fn run_info(executor: &Executor, table: TableKind, ops: &[Mop]) -> Error {
    match executor.execute_batch(table, ops).expect("validation failed") {
        BatchOutcome::Info { error } => error,
        BatchOutcome::Ok { value } => panic!("Expected info, got ok: {:?}", value),
    }
}

/// Read one key in its own batch.
pub fn read(executor: &Executor, table: TableKind, k: i64) -> Option<Value> {
    run_ok(executor, table, &[Mop::read(k)]).remove(0).v
}

/// Share an executor across threads.
pub fn shared(executor: Executor) -> Arc<Executor> {
    Arc::new(executor)
}
