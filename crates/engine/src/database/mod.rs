//! Database struct and open/close logic
//!
//! This module provides the main Database struct that orchestrates:
//! - Data directory and `mopstore.toml` configuration
//! - WAL opening
//! - Automatic recovery on startup
//! - Transaction API
//!
//! ## Transaction API
//!
//! The Database provides two ways to execute transactions:
//!
//! 1. **Closure API** (recommended): `db.transaction(|txn| { ... })`
//!    - Automatic commit on success, abort on error
//!    - Returns the closure's return value
//!
//! 2. **Manual API**: `begin_transaction()` + `commit_transaction()` /
//!    `abort_transaction()`
//!    - For cases requiring external control over commit timing
//!
//! Every transaction holds the database's writer lock from begin to
//! commit/abort, so transactions are serializable.

pub mod config;
mod registry;

pub use config::{MopStoreConfig, CONFIG_FILE_NAME, DEFAULT_BUSY_TIMEOUT_MS};
pub use registry::OPEN_DATABASES;

use crate::coordinator::{TransactionCoordinator, TransactionMetrics};
use crate::properties::{RowCounts, StoreProperties, ISOLATION, JOURNAL_MODE, LOCKING_MODE};
use mopstore_concurrency::{RecoveryCoordinator, TransactionContext};
use mopstore_core::{Row, Storage, StoreError, StoreResult, TableKind};
use mopstore_durability::{DurabilityMode, WAL, WAL_DIR, WAL_FILE};
use mopstore_storage::TableStore;
use parking_lot::Mutex;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

/// Name reported for databases with no data directory
const EPHEMERAL_NAME: &str = ":memory:";

/// Controls where data is stored (orthogonal to durability)
///
/// | PersistenceMode | DurabilityMode | Behavior |
/// |-----------------|----------------|----------|
/// | Ephemeral | (ignored) | No files, data lost on drop |
/// | Disk | None | Directory and config only, no WAL appends |
/// | Disk | Standard | WAL, batched fsync |
/// | Disk | Always | WAL, fsync per commit |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum PersistenceMode {
    /// No disk files at all - data exists only in memory
    Ephemeral,
    /// Data directory on disk
    #[default]
    Disk,
}

/// Main database struct with transaction support
///
/// Orchestrates storage, WAL, recovery, and transactions.
///
/// # Example
///
/// ```text
/// use mopstore_engine::Database;
/// use mopstore_core::{TableKind, Value};
///
/// let db = Database::open("/path/to/data")?;
///
/// let value = db.transaction(|txn| {
///     txn.put_merge(TableKind::Append, 1, Value::from("x"))?;
///     txn.get(TableKind::Append, 1)
/// })?;
/// ```
pub struct Database {
    /// Canonical data directory (empty for ephemeral databases)
    data_dir: PathBuf,

    /// Committed state of all tables
    storage: Arc<TableStore>,

    /// Write-ahead log; `None` for ephemeral databases and durability `none`
    wal: Option<Arc<WAL>>,

    persistence_mode: PersistenceMode,

    /// Transaction coordinator (writer lock, versions, metrics)
    coordinator: TransactionCoordinator,

    durability_mode: DurabilityMode,

    config: MopStoreConfig,

    /// Cleared by `shutdown()`
    accepting_transactions: AtomicBool,

    /// Signals the standard-mode flush thread to stop
    flush_shutdown: Arc<AtomicBool>,

    /// Standard-mode background flush thread
    flush_handle: Mutex<Option<JoinHandle<()>>>,

    /// Exclusive process-level lock on `<data_dir>/.lock`
    _lock_file: Option<File>,
}

impl Database {
    /// Open database at given path with automatic recovery
    ///
    /// Creates the directory if needed and writes a default `mopstore.toml`
    /// on first open. Settings are read from that file.
    ///
    /// Opening a path that is already open in this process returns the
    /// existing instance.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created, the config is invalid,
    /// another process holds the database, or the WAL cannot be replayed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        MopStoreConfig::write_default_if_missing(&config_path)?;
        let cfg = MopStoreConfig::from_file(&config_path)?;

        Self::open_with_mode_and_config(data_dir, cfg)
    }

    /// Open database at the given path with an explicit configuration.
    ///
    /// The supplied config is written to `mopstore.toml` so that subsequent
    /// `Database::open()` calls (e.g. after restart) pick up the same settings.
    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: MopStoreConfig) -> StoreResult<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        // Reject a bad mode before persisting it
        cfg.durability_mode()?;
        cfg.write_to_file(&data_dir.join(CONFIG_FILE_NAME))?;

        Self::open_with_mode_and_config(data_dir, cfg)
    }

    fn open_with_mode_and_config(data_dir: PathBuf, cfg: MopStoreConfig) -> StoreResult<Arc<Self>> {
        let durability_mode = cfg.durability_mode()?;
        let canonical_path = data_dir.canonicalize()?;

        // Held for the whole open so only one thread creates a database per path
        let mut registry = OPEN_DATABASES.lock();

        if let Some(db) = registry.get(&canonical_path).and_then(Weak::upgrade) {
            info!(target: "mopstore::db", path = ?canonical_path, "Returning existing database instance");
            return Ok(db);
        }

        // Exclusive filesystem lock: two processes appending to one WAL
        // would interleave their entries
        let lock_path = canonical_path.join(".lock");
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::storage(format!("failed to open lock file: {}", e)))?;
        fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| {
            StoreError::storage(format!(
                "database at '{}' is already in use by another process",
                canonical_path.display()
            ))
        })?;

        let wal_path = canonical_path.join(WAL_DIR).join(WAL_FILE);
        let result = RecoveryCoordinator::new(wal_path.clone()).recover()?;

        let wal = if durability_mode.requires_wal() {
            Some(Arc::new(WAL::open(&wal_path, durability_mode)?))
        } else {
            None
        };

        let coordinator = TransactionCoordinator::from_manager(
            result.txn_manager.with_busy_timeout(cfg.busy_timeout()),
        );

        let flush_shutdown = Arc::new(AtomicBool::new(false));
        let flush_handle = match (&wal, durability_mode) {
            (Some(wal), DurabilityMode::Standard { interval_ms, .. }) => Some(spawn_flush_thread(
                Arc::clone(wal),
                Arc::clone(&flush_shutdown),
                Duration::from_millis(interval_ms),
            )?),
            _ => None,
        };

        info!(
            target: "mopstore::db",
            path = %canonical_path.display(),
            durability = %durability_mode,
            busy_timeout_ms = cfg.busy_timeout_ms,
            version = result.stats.final_version,
            "Database opened"
        );

        let db = Arc::new(Self {
            data_dir: canonical_path.clone(),
            storage: Arc::new(result.storage),
            wal,
            persistence_mode: PersistenceMode::Disk,
            coordinator,
            durability_mode,
            config: cfg,
            accepting_transactions: AtomicBool::new(true),
            flush_shutdown,
            flush_handle: Mutex::new(flush_handle),
            _lock_file: Some(lock_file),
        });

        registry.insert(canonical_path, Arc::downgrade(&db));
        Ok(db)
    }

    /// Create an in-memory database with no disk I/O
    ///
    /// No files, no WAL, no recovery; data is lost when dropped. Each call
    /// creates a new instance.
    pub fn ephemeral() -> Arc<Self> {
        Self::ephemeral_with_config(MopStoreConfig::with_durability(DurabilityMode::None))
    }

    /// In-memory database using the busy timeout from `cfg`
    ///
    /// The durability setting is ignored: nothing is ever written.
    pub fn ephemeral_with_config(cfg: MopStoreConfig) -> Arc<Self> {
        let cfg = MopStoreConfig {
            durability: DurabilityMode::None.name().to_string(),
            ..cfg
        };
        Arc::new(Self {
            data_dir: PathBuf::new(),
            storage: Arc::new(TableStore::new()),
            wal: None,
            persistence_mode: PersistenceMode::Ephemeral,
            coordinator: TransactionCoordinator::new(0, cfg.busy_timeout()),
            durability_mode: DurabilityMode::None,
            config: cfg,
            accepting_transactions: AtomicBool::new(true),
            flush_shutdown: Arc::new(AtomicBool::new(false)),
            flush_handle: Mutex::new(None),
            _lock_file: None,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Data directory (empty for ephemeral databases)
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// True for databases created by `ephemeral()`
    pub fn is_ephemeral(&self) -> bool {
        self.persistence_mode == PersistenceMode::Ephemeral
    }

    /// Durability mode in effect
    pub fn durability_mode(&self) -> DurabilityMode {
        self.durability_mode
    }

    /// Configuration the database was opened with
    pub fn config(&self) -> &MopStoreConfig {
        &self.config
    }

    /// Default writer-lock busy timeout
    pub fn busy_timeout(&self) -> Duration {
        self.coordinator.busy_timeout()
    }

    /// Version of the last committed write transaction
    pub fn current_version(&self) -> u64 {
        self.coordinator.current_version()
    }

    /// Transaction counters
    pub fn metrics(&self) -> TransactionMetrics {
        self.coordinator.metrics()
    }

    /// False after `shutdown()`
    pub fn is_open(&self) -> bool {
        self.accepting_transactions.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Reads outside transactions
    // ========================================================================

    /// Every committed row of `table`
    ///
    /// Ordered by key (and member id for the set table). Reads committed
    /// state only, so rows buffered by an in-flight transaction never show.
    pub fn list(&self, table: TableKind) -> StoreResult<Vec<Row>> {
        self.storage.scan(table)
    }

    /// Properties report for this database
    pub fn properties(&self) -> StoreProperties {
        StoreProperties {
            name: if self.is_ephemeral() {
                EPHEMERAL_NAME.to_string()
            } else {
                self.data_dir.display().to_string()
            },
            durability: self.durability_mode.name().to_string(),
            journal_mode: JOURNAL_MODE.to_string(),
            locking_mode: LOCKING_MODE.to_string(),
            isolation: ISOLATION.to_string(),
            busy_timeout_ms: self.config.busy_timeout_ms,
            current_version: self.current_version(),
            wal_size_bytes: self.wal.as_ref().map(|w| w.size()),
            rows: RowCounts {
                lww: self.storage.row_count(TableKind::Lww),
                append: self.storage.row_count(TableKind::Append),
                set: self.storage.row_count(TableKind::Set),
            },
            transactions: self.coordinator.metrics(),
        }
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    fn check_accepting(&self) -> StoreResult<()> {
        if !self.is_open() {
            return Err(StoreError::invalid_input(
                "Database is shutting down".to_string(),
            ));
        }
        Ok(())
    }

    /// Commit on `Ok`, abort on `Err`
    fn run_single_attempt<T>(
        &self,
        txn: &mut TransactionContext,
        result: StoreResult<T>,
    ) -> StoreResult<(T, u64)> {
        match result {
            Ok(value) => {
                let commit_version = self.commit_transaction(txn)?;
                Ok((value, commit_version))
            }
            Err(e) => {
                warn!(target: "mopstore::txn", txn_id = txn.txn_id, error = %e, "Transaction aborted by closure");
                let _ = self.coordinator.abort(txn, format!("Closure error: {}", e));
                Err(e)
            }
        }
    }

    /// Execute a transaction with the given closure
    ///
    /// Commits when the closure returns `Ok`, aborts (discarding every
    /// buffered write) when it returns `Err`.
    ///
    /// # Example
    /// ```text
    /// let seen = db.transaction(|txn| {
    ///     txn.put_overwrite(TableKind::Lww, 1, Value::Int(5))?;
    ///     txn.get(TableKind::Lww, 1)
    /// })?;
    /// ```
    pub fn transaction<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut TransactionContext) -> StoreResult<T>,
    {
        self.transaction_with_version(f).map(|(value, _)| value)
    }

    /// Like `transaction()` but also returns the commit version
    pub fn transaction_with_version<F, T>(&self, f: F) -> StoreResult<(T, u64)>
    where
        F: FnOnce(&mut TransactionContext) -> StoreResult<T>,
    {
        self.transaction_with_timeout(self.busy_timeout(), f)
    }

    /// Like `transaction_with_version()` with an explicit writer-lock timeout
    pub fn transaction_with_timeout<F, T>(&self, timeout: Duration, f: F) -> StoreResult<(T, u64)>
    where
        F: FnOnce(&mut TransactionContext) -> StoreResult<T>,
    {
        let mut txn = self.begin_transaction_with_timeout(timeout)?;
        let result = f(&mut txn);
        self.run_single_attempt(&mut txn, result)
    }

    /// Begin a new transaction (for manual control)
    ///
    /// The returned context holds the writer lock until it is committed,
    /// aborted or dropped.
    ///
    /// # Errors
    ///
    /// `StoreError::Busy` if another transaction holds the lock past the
    /// busy timeout.
    pub fn begin_transaction(&self) -> StoreResult<TransactionContext> {
        self.begin_transaction_with_timeout(self.busy_timeout())
    }

    /// Begin a transaction, waiting at most `timeout` for the writer lock
    pub fn begin_transaction_with_timeout(&self, timeout: Duration) -> StoreResult<TransactionContext> {
        self.check_accepting()?;
        self.coordinator.start_transaction(&self.storage, timeout)
    }

    /// Commit a transaction
    ///
    /// Writes the WAL records (if this database has a WAL), then installs the
    /// buffered writes. Returns the commit version.
    pub fn commit_transaction(&self, txn: &mut TransactionContext) -> StoreResult<u64> {
        self.coordinator.commit(txn, self.wal.as_deref())
    }

    /// Abort a transaction, discarding its buffered writes
    pub fn abort_transaction(&self, txn: &mut TransactionContext, reason: &str) -> StoreResult<()> {
        self.coordinator.abort(txn, reason.to_string())
    }

    // ========================================================================
    // Flush / Shutdown
    // ========================================================================

    /// Flush and fsync the WAL
    ///
    /// For databases without a WAL, this is a no-op.
    pub fn flush(&self) -> StoreResult<()> {
        match &self.wal {
            Some(wal) => wal.fsync(),
            None => Ok(()),
        }
    }

    /// Stop accepting transactions, wait for the active one, and flush
    ///
    /// Idempotent.
    pub fn shutdown(&self) -> StoreResult<()> {
        self.accepting_transactions.store(false, Ordering::SeqCst);
        self.stop_flush_thread();

        if !self.coordinator.wait_for_idle(Duration::from_secs(30)) {
            warn!(target: "mopstore::db", "Shutdown timed out waiting for the active transaction");
        }

        self.flush()
    }

    fn stop_flush_thread(&self) {
        self.flush_shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.flush_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

fn spawn_flush_thread(
    wal: Arc<WAL>,
    shutdown: Arc<AtomicBool>,
    interval: Duration,
) -> StoreResult<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("mopstore-wal-flush".to_string())
        .spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                std::thread::sleep(interval);
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(e) = wal.sync_if_overdue() {
                    warn!(target: "mopstore::db", error = %e, "Background WAL sync failed");
                }
            }
        })
        .map_err(|e| StoreError::storage(format!("failed to spawn WAL flush thread: {}", e)))
}

impl Drop for Database {
    fn drop(&mut self) {
        self.stop_flush_thread();

        // Final flush to persist any remaining data
        let _ = self.flush();

        if self.persistence_mode == PersistenceMode::Disk {
            let mut registry = OPEN_DATABASES.lock();
            // A newer instance may already have replaced this entry
            let stale = registry
                .get(&self.data_dir)
                .map_or(false, |weak| weak.strong_count() == 0);
            if stale {
                registry.remove(&self.data_dir);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mopstore_core::Value;
    use mopstore_durability::WALEntry;
    use tempfile::TempDir;

    fn always() -> MopStoreConfig {
        MopStoreConfig::with_durability(DurabilityMode::Always)
    }

    fn wal_path(dir: &Path) -> PathBuf {
        dir.join(WAL_DIR).join(WAL_FILE)
    }

    #[test]
    fn test_open_creates_directory_and_config() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("new_db");
        assert!(!db_path.exists());

        let db = Database::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert!(db_path.join(CONFIG_FILE_NAME).exists());
        assert!(wal_path(&db_path).exists());
        assert!(!db.is_ephemeral());
        assert!(matches!(
            db.durability_mode(),
            DurabilityMode::Standard { .. }
        ));
    }

    #[test]
    fn test_ephemeral_no_files() {
        let db = Database::ephemeral();
        assert!(db.is_ephemeral());
        assert_eq!(db.data_dir(), Path::new(""));
        assert_eq!(db.properties().name, ":memory:");
        assert_eq!(db.properties().wal_size_bytes, None);
    }

    #[test]
    fn test_open_reads_always_config() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("db");
        std::fs::create_dir_all(&db_path).unwrap();
        std::fs::write(
            db_path.join(CONFIG_FILE_NAME),
            "durability = \"always\"\nbusy_timeout_ms = 42\n",
        )
        .unwrap();

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.durability_mode(), DurabilityMode::Always);
        assert_eq!(db.busy_timeout(), Duration::from_millis(42));
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("db");
        std::fs::create_dir_all(&db_path).unwrap();
        std::fs::write(db_path.join(CONFIG_FILE_NAME), "durability = \"fast\"\n").unwrap();

        assert!(Database::open(&db_path).is_err());
    }

    #[test]
    fn test_open_with_config_persists_it() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("db");

        {
            let _db = Database::open_with_config(&db_path, always()).unwrap();
        }
        let cfg = MopStoreConfig::from_file(&db_path.join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(cfg.durability, "always");
    }

    #[test]
    fn test_open_same_path_returns_same_instance() {
        let temp_dir = TempDir::new().unwrap();
        let db1 = Database::open(temp_dir.path()).unwrap();
        let db2 = Database::open(temp_dir.path()).unwrap();
        assert!(Arc::ptr_eq(&db1, &db2));
    }

    #[test]
    fn test_ephemeral_instances_are_distinct() {
        let db1 = Database::ephemeral();
        let db2 = Database::ephemeral();
        assert!(!Arc::ptr_eq(&db1, &db2));
    }

    #[test]
    fn test_open_close_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("db");

        {
            let db = Database::open_with_config(&db_path, always()).unwrap();
            db.transaction(|txn| {
                txn.put_overwrite(TableKind::Lww, 1, Value::Int(10))?;
                txn.put_merge(TableKind::Append, 1, Value::from("a"))?;
                txn.insert_set_member(TableKind::Set, None, 1, Value::Int(1))
            })
            .unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.current_version(), 1);
        let lww = db.list(TableKind::Lww).unwrap();
        assert_eq!(lww.len(), 1);
        assert_eq!(lww[0].v, Value::Int(10));
        assert_eq!(lww[0].version, 1);
        assert_eq!(db.list(TableKind::Set).unwrap()[0].id, Some(1));

        // Set ids continue after restart
        let id = db
            .transaction(|txn| txn.insert_set_member(TableKind::Set, None, 1, Value::Int(2)))
            .unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn test_recovery_discards_incomplete() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("db");

        {
            let wal = WAL::open(wal_path(&db_path), DurabilityMode::Always).unwrap();
            wal.append(&WALEntry::BeginTxn {
                txn_id: 1,
                timestamp: Utc::now().timestamp_micros(),
            })
            .unwrap();
            wal.append(&WALEntry::Put {
                txn_id: 1,
                table: TableKind::Lww,
                key: 1,
                value: Value::Int(1),
                version: 1,
            })
            .unwrap();
            // No CommitTxn: the process died mid-commit
        }

        let db = Database::open(&db_path).unwrap();
        assert!(db.list(TableKind::Lww).unwrap().is_empty());
        assert_eq!(db.current_version(), 0);
    }

    #[test]
    fn test_durability_none_writes_no_wal_entries() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("db");

        {
            let db = Database::open_with_config(
                &db_path,
                MopStoreConfig::with_durability(DurabilityMode::None),
            )
            .unwrap();
            db.transaction(|txn| txn.put_overwrite(TableKind::Lww, 1, Value::Int(1)))
                .unwrap();
            assert_eq!(db.properties().wal_size_bytes, None);
        }

        let db = Database::open(&db_path).unwrap();
        assert!(db.list(TableKind::Lww).unwrap().is_empty());
    }

    #[test]
    fn test_transaction_closure_api() {
        let db = Database::ephemeral();

        let (value, version) = db
            .transaction_with_version(|txn| {
                txn.put_overwrite(TableKind::Lww, 1, Value::Int(5))?;
                txn.get(TableKind::Lww, 1)
            })
            .unwrap();

        assert_eq!(value, Some(Value::Int(5)));
        assert_eq!(version, 1);
        assert_eq!(db.metrics().total_committed, 1);
    }

    #[test]
    fn test_transaction_aborts_on_closure_error() {
        let db = Database::ephemeral();

        let result: StoreResult<()> = db.transaction(|txn| {
            txn.put_overwrite(TableKind::Lww, 1, Value::Int(1))?;
            Err(StoreError::constraint("forced"))
        });

        assert!(result.is_err());
        assert!(db.list(TableKind::Lww).unwrap().is_empty());
        assert_eq!(db.current_version(), 0);
        assert_eq!(db.metrics().total_aborted, 1);
    }

    #[test]
    fn test_begin_and_commit_manual() {
        let db = Database::ephemeral();

        let mut txn = db.begin_transaction().unwrap();
        txn.put_merge(TableKind::Append, 1, Value::from("a")).unwrap();
        // Uncommitted writes are not listed
        assert!(db.list(TableKind::Append).unwrap().is_empty());
        db.commit_transaction(&mut txn).unwrap();

        assert_eq!(db.list(TableKind::Append).unwrap()[0].v, Value::from("a"));
    }

    #[test]
    fn test_abort_transaction_manual() {
        let db = Database::ephemeral();

        let mut txn = db.begin_transaction().unwrap();
        txn.put_merge(TableKind::Append, 1, Value::from("a")).unwrap();
        db.abort_transaction(&mut txn, "client cancelled").unwrap();
        assert!(txn.is_aborted());

        // Lock released: the next transaction begins without waiting
        assert!(db.begin_transaction_with_timeout(Duration::ZERO).is_ok());
        assert!(db.list(TableKind::Append).unwrap().is_empty());
    }

    #[test]
    fn test_busy_while_transaction_open() {
        let db = Database::ephemeral_with_config(MopStoreConfig {
            busy_timeout_ms: 10,
            ..MopStoreConfig::default()
        });

        let _held = db.begin_transaction().unwrap();
        let err = db
            .transaction(|txn| txn.put_overwrite(TableKind::Lww, 1, Value::Int(1)))
            .unwrap_err();
        assert!(err.is_busy());
        assert_eq!(db.metrics().total_busy, 1);
    }

    #[test]
    fn test_shutdown_rejects_new_transactions() {
        let db = Database::ephemeral();
        assert!(db.is_open());

        db.shutdown().unwrap();
        db.shutdown().unwrap();
        assert!(!db.is_open());
        assert!(db.begin_transaction().is_err());
    }

    #[test]
    fn test_shutdown_after_dropped_transaction() {
        let db = Database::ephemeral();
        let txn = db.begin_transaction().unwrap();
        drop(txn);

        let start = std::time::Instant::now();
        db.shutdown().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(db.metrics().active_count, 0);
    }

    #[test]
    fn test_properties() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_with_config(temp_dir.path(), always()).unwrap();
        db.transaction(|txn| {
            txn.put_overwrite(TableKind::Lww, 1, Value::Int(1))?;
            txn.insert_set_member(TableKind::Set, None, 1, Value::Int(1))?;
            txn.insert_set_member(TableKind::Set, None, 1, Value::Int(2))
        })
        .unwrap();

        let props = db.properties();
        assert_eq!(props.durability, "always");
        assert_eq!(props.journal_mode, "wal");
        assert_eq!(props.locking_mode, "exclusive-writer");
        assert_eq!(props.isolation, "serializable");
        assert_eq!(props.current_version, 1);
        assert_eq!(props.rows.lww, 1);
        assert_eq!(props.rows.set, 2);
        assert!(props.wal_size_bytes.unwrap() > 0);
        assert_eq!(props.transactions.total_committed, 1);
    }

    #[test]
    fn test_flush() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path()).unwrap();
        db.transaction(|txn| txn.put_overwrite(TableKind::Lww, 1, Value::Int(1)))
            .unwrap();
        db.flush().unwrap();
        Database::ephemeral().flush().unwrap();
    }
}
