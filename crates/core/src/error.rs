//! Error types for mopstore
//!
//! This module defines the engine-wide error type. Every layer below the
//! executor (storage, durability, concurrency, engine) reports failures as a
//! [`StoreError`]. We use `thiserror` for automatic `Display` and `Error`
//! trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error types for the store
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected (bad checksum, impossible length)
    #[error("data corruption: {0}")]
    Corruption(String),

    /// Entry is truncated; more bytes are needed to decode it
    #[error("incomplete entry at offset {offset}: have {have} bytes, need {needed}")]
    IncompleteEntry {
        /// File offset of the entry
        offset: u64,
        /// Bytes available
        have: usize,
        /// Bytes required
        needed: usize,
    },

    /// Malformed request or argument
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong
        reason: String,
    },

    /// A table constraint would be violated (duplicate identity, affected-row count)
    #[error("constraint violation: {reason}")]
    ConstraintViolation {
        /// Which constraint and why
        reason: String,
    },

    /// The writer lock could not be acquired in time
    #[error("database busy: writer lock not acquired within {waited_ms} ms")]
    Busy {
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Operation on a transaction that is no longer active
    #[error("transaction {txn_id} is not active: {state}")]
    TransactionNotActive {
        /// Transaction identifier
        txn_id: u64,
        /// Current state, rendered for diagnostics
        state: String,
    },

    /// Storage layer error
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Build an `InvalidInput` error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        StoreError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Build a `ConstraintViolation` error
    pub fn constraint(reason: impl Into<String>) -> Self {
        StoreError::ConstraintViolation {
            reason: reason.into(),
        }
    }

    /// Build a `Busy` error
    pub fn busy(waited_ms: u64) -> Self {
        StoreError::Busy { waited_ms }
    }

    /// Build a `Corruption` error
    pub fn corruption(msg: impl Into<String>) -> Self {
        StoreError::Corruption(msg.into())
    }

    /// Build a `Storage` error
    pub fn storage(msg: impl Into<String>) -> Self {
        StoreError::Storage(msg.into())
    }

    /// True for failures caused by lock contention rather than data
    pub fn is_busy(&self) -> bool {
        matches!(self, StoreError::Busy { .. })
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
