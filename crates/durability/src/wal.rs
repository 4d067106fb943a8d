//! WAL (Write-Ahead Log) entry types and file operations
//!
//! Entry types:
//! - BeginTxn: start of a committed unit
//! - Put: register write (lww or append table), carrying the final value
//! - Insert: growable-set member insertion
//! - CommitTxn: the unit is durable and must be replayed
//! - AbortTxn: the unit was rolled back
//!
//! Every entry carries its `txn_id`, so replay groups entries by transaction
//! without tracking an "active" transaction.
//!
//! ## File Operations
//!
//! - `WAL::open()` - Open existing WAL or create new one; a torn tail is cut off
//! - `WAL::append()` - Write encoded entry to end of file
//! - `WAL::read_all()` - Scan from beginning, decode entries
//! - `WAL::flush()` / `WAL::fsync()` - Push buffered writes to the OS / to disk
//! - `WAL::size()` - Current file size
//!
//! The sync policy from [`DurabilityMode`] is applied at transaction
//! boundaries (CommitTxn / AbortTxn), never in the middle of a unit.
//!
//! A failed write or sync leaves the log in an unknown state: the bytes may
//! or may not have reached disk. From then on the WAL refuses every append
//! until it is reopened, so nothing is ever written after a unit whose fate
//! is unknown.

use crate::encoding::{decode_entry, encode_entry};
use crate::mode::DurabilityMode;
use mopstore_core::{Key, RowId, StoreError, StoreResult, TableKind, Value};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::warn;

/// WAL entry types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum WALEntry {
    /// Begin transaction
    BeginTxn {
        /// Transaction identifier
        txn_id: u64,
        /// Wall-clock start time (microseconds since the Unix epoch)
        timestamp: i64,
    },

    /// Register write
    Put {
        /// Owning transaction
        txn_id: u64,
        /// Target table (`lww` or `append`)
        table: TableKind,
        /// Row key
        key: Key,
        /// Full value after merge
        value: Value,
        /// Commit version of the owning transaction
        version: u64,
    },

    /// Set member insertion
    Insert {
        /// Owning transaction
        txn_id: u64,
        /// Member identity
        id: RowId,
        /// Set key
        key: Key,
        /// Member value
        value: Value,
        /// Commit version of the owning transaction
        version: u64,
    },

    /// Commit transaction
    CommitTxn {
        /// Transaction identifier
        txn_id: u64,
    },

    /// Abort transaction
    AbortTxn {
        /// Transaction identifier
        txn_id: u64,
    },
}

impl WALEntry {
    /// Transaction this entry belongs to
    pub fn txn_id(&self) -> u64 {
        match self {
            WALEntry::BeginTxn { txn_id, .. }
            | WALEntry::Put { txn_id, .. }
            | WALEntry::Insert { txn_id, .. }
            | WALEntry::CommitTxn { txn_id }
            | WALEntry::AbortTxn { txn_id } => *txn_id,
        }
    }

    /// Version carried by data entries
    pub fn version(&self) -> Option<u64> {
        match self {
            WALEntry::Put { version, .. } | WALEntry::Insert { version, .. } => Some(*version),
            _ => None,
        }
    }

    /// Check if entry is a transaction boundary
    pub fn is_txn_boundary(&self) -> bool {
        matches!(
            self,
            WALEntry::BeginTxn { .. } | WALEntry::CommitTxn { .. } | WALEntry::AbortTxn { .. }
        )
    }

    /// Check if entry ends a transaction
    pub fn is_txn_end(&self) -> bool {
        matches!(self, WALEntry::CommitTxn { .. } | WALEntry::AbortTxn { .. })
    }
}

/// Write-Ahead Log with configurable durability
///
/// Append-only log of framed entries (see [`crate::encoding`]).
///
/// # Example
///
/// ```ignore
/// use mopstore_durability::{DurabilityMode, WALEntry, WAL};
///
/// let wal = WAL::open("data/wal/current.wal", DurabilityMode::Always)?;
/// wal.append(&WALEntry::CommitTxn { txn_id: 1 })?;
/// let entries = wal.read_all()?;
/// ```
pub struct WAL {
    /// File path
    path: PathBuf,

    /// Buffered writer for appends
    writer: Mutex<BufWriter<File>>,

    /// Current file offset
    current_offset: AtomicU64,

    /// Durability mode
    durability_mode: DurabilityMode,

    /// Last fsync time (standard mode)
    last_fsync: Mutex<Instant>,

    /// Commits since last fsync (standard mode)
    commits_since_fsync: AtomicU64,

    /// Set by the first failed write or sync
    failed: AtomicBool,
}

impl WAL {
    /// Open existing WAL or create new one with specified durability mode
    ///
    /// Creates parent directories if they don't exist. If the file ends in a
    /// truncated or corrupt entry (a write torn by a crash), the file is cut
    /// back to the last complete entry so new appends stay readable.
    ///
    /// # Errors
    ///
    /// `StoreError::Corruption` if a corrupt entry is followed by more data:
    /// that is damage, not a torn tail, and cutting it off would drop
    /// committed units.
    pub fn open<P: AsRef<Path>>(path: P, durability_mode: DurabilityMode) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        let file_len = file.metadata()?.len();
        let (_, valid_len) = scan_file(&path)?;
        if valid_len < file_len {
            warn!(
                target: "mopstore::recovery",
                path = %path.display(),
                valid_len,
                file_len,
                "Truncating torn WAL tail"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            current_offset: AtomicU64::new(valid_len),
            durability_mode,
            last_fsync: Mutex::new(Instant::now()),
            commits_since_fsync: AtomicU64::new(0),
            failed: AtomicBool::new(false),
        })
    }

    /// Append entry to WAL
    ///
    /// Returns the offset where the entry was written. On a transaction end
    /// entry the durability mode decides whether to fsync; the buffer is
    /// always flushed to the OS at that point.
    ///
    /// # Errors
    ///
    /// Any I/O failure puts the WAL into the failed state (see
    /// [`WAL::is_failed`]); later appends fail without touching the file.
    pub fn append(&self, entry: &WALEntry) -> StoreResult<u64> {
        self.ensure_usable()?;
        let encoded = encode_entry(entry)?;

        let offset = {
            let mut writer = self.writer.lock();
            let offset = self.current_offset.load(Ordering::SeqCst);
            let written = writer.write_all(&encoded).map_err(|e| {
                StoreError::storage(format!("failed to write entry at offset {}: {}", offset, e))
            });
            self.track(written)?;
            self.current_offset
                .fetch_add(encoded.len() as u64, Ordering::SeqCst);
            offset
        };

        if entry.is_txn_end() {
            let synced = self.sync_boundary();
            self.track(synced)?;
        }

        Ok(offset)
    }

    /// True once a write or sync has failed
    ///
    /// A failed WAL accepts no further entries; reopen the database to
    /// recover from what actually reached disk.
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn ensure_usable(&self) -> StoreResult<()> {
        if self.is_failed() {
            Err(StoreError::storage(format!(
                "WAL {} failed earlier and accepts no more entries until reopened",
                self.path.display()
            )))
        } else {
            Ok(())
        }
    }

    fn track<T>(&self, result: StoreResult<T>) -> StoreResult<T> {
        if let Err(e) = &result {
            if !self.failed.swap(true, Ordering::SeqCst) {
                warn!(
                    target: "mopstore::db",
                    path = %self.path.display(),
                    error = %e,
                    "WAL write failed, refusing further entries"
                );
            }
        }
        result
    }

    fn sync_boundary(&self) -> StoreResult<()> {
        match self.durability_mode {
            DurabilityMode::Always => self.fsync(),
            DurabilityMode::Standard {
                interval_ms,
                batch_size,
            } => {
                let commits = self.commits_since_fsync.fetch_add(1, Ordering::SeqCst) + 1;
                let should_fsync = {
                    let last = self.last_fsync.lock();
                    last.elapsed().as_millis() as u64 >= interval_ms
                        || commits >= batch_size as u64
                };

                if should_fsync {
                    self.fsync()?;
                    self.commits_since_fsync.store(0, Ordering::SeqCst);
                    *self.last_fsync.lock() = Instant::now();
                    Ok(())
                } else {
                    self.flush()
                }
            }
            DurabilityMode::None => self.flush(),
        }
    }

    /// Flush buffered writes to OS buffers
    pub fn flush(&self) -> StoreResult<()> {
        let mut writer = self.writer.lock();
        writer
            .flush()
            .map_err(|e| StoreError::storage(format!("failed to flush WAL: {}", e)))
    }

    /// Force sync to disk (flush + fsync)
    pub fn fsync(&self) -> StoreResult<()> {
        let mut writer = self.writer.lock();
        writer
            .flush()
            .map_err(|e| StoreError::storage(format!("failed to flush: {}", e)))?;
        writer
            .get_mut()
            .sync_all()
            .map_err(|e| StoreError::storage(format!("failed to fsync: {}", e)))
    }

    /// Fsync if standard mode has unsynced commits older than its interval
    ///
    /// Called periodically by the engine's flush thread so an idle database
    /// does not leave the last few commits unsynced. Returns whether an
    /// fsync happened.
    pub fn sync_if_overdue(&self) -> StoreResult<bool> {
        let DurabilityMode::Standard { interval_ms, .. } = self.durability_mode else {
            return Ok(false);
        };
        if self.commits_since_fsync.load(Ordering::SeqCst) == 0 {
            return Ok(false);
        }
        if (self.last_fsync.lock().elapsed().as_millis() as u64) < interval_ms {
            return Ok(false);
        }

        self.ensure_usable()?;
        let synced = self.fsync();
        self.track(synced)?;
        self.commits_since_fsync.store(0, Ordering::SeqCst);
        *self.last_fsync.lock() = Instant::now();
        Ok(true)
    }

    /// Read all complete entries from the beginning of the file
    ///
    /// Stops at a truncated or corrupt final entry; a corrupt entry with data
    /// after it is an error.
    pub fn read_all(&self) -> StoreResult<Vec<WALEntry>> {
        self.flush()?;
        let (entries, _) = scan_file(&self.path)?;
        Ok(entries)
    }

    /// Get current file size (offset for next write)
    pub fn size(&self) -> u64 {
        self.current_offset.load(Ordering::SeqCst)
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get durability mode
    pub fn durability_mode(&self) -> DurabilityMode {
        self.durability_mode
    }
}

impl Drop for WAL {
    fn drop(&mut self) {
        // Final fsync so a clean shutdown loses nothing
        let _ = self.fsync();
    }
}

/// Decode every complete entry of the file at `path`
///
/// Returns the entries and the byte length of the valid prefix. Only the
/// last entry may be damaged.
fn scan_file(path: &Path) -> StoreResult<(Vec<WALEntry>, u64)> {
    let mut buf = Vec::new();
    File::open(path)?.read_to_end(&mut buf)?;

    let mut entries = Vec::new();
    let mut offset = 0usize;
    while offset < buf.len() {
        match decode_entry(&buf[offset..], offset as u64) {
            Ok((entry, consumed)) => {
                entries.push(entry);
                offset += consumed;
            }
            Err(StoreError::IncompleteEntry { .. }) => break,
            Err(e) if is_torn_tail(&buf[offset..]) => {
                warn!(
                    target: "mopstore::recovery",
                    offset,
                    error = %e,
                    "Stopping WAL scan at corrupt final entry"
                );
                break;
            }
            Err(e) => {
                return Err(StoreError::corruption(format!(
                    "{}: {} (followed by {} more bytes)",
                    path.display(),
                    e,
                    buf.len() - offset
                )))
            }
        }
    }

    Ok((entries, offset as u64))
}

/// True if the damaged entry at the start of `rest` is the last thing in the file
///
/// Either its frame reaches end of file, or everything left is zero fill
/// from a file extended by a crash before its data landed.
fn is_torn_tail(rest: &[u8]) -> bool {
    if rest.iter().all(|b| *b == 0) {
        return true;
    }
    match rest.get(..4) {
        Some(len) => {
            let declared = u32::from_le_bytes([len[0], len[1], len[2], len[3]]) as usize;
            4 + declared >= rest.len()
        }
        None => true,
    }
}
