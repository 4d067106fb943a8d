//! Durability layer for mopstore
//!
//! This crate handles everything that touches disk:
//!
//! - WAL: append-only write-ahead log, one group of entries per committed unit
//! - Entry codec: length-prefixed, CRC-checked MessagePack frames
//! - Durability modes: None, Standard (default), Always
//! - Recovery: replay of committed units into a [`mopstore_core::Storage`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod mode;
pub mod recovery;
pub mod wal;

pub use mode::DurabilityMode;
pub use recovery::{replay_wal, ReplayStats};
pub use wal::{WALEntry, WAL};

/// WAL directory inside a data directory
pub const WAL_DIR: &str = "wal";

/// WAL file name inside [`WAL_DIR`]
pub const WAL_FILE: &str = "current.wal";
