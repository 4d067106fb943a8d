//! Error types for batch execution.
//!
//! All errors from batch execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Carried inside `info` and `fail` responses as JSON
//! - **Lossless**: No error information is lost in conversion from [`StoreError`]
//!
//! [`StoreError`]: mopstore_core::StoreError

use serde::{Deserialize, Serialize};

/// Batch execution errors.
///
/// # Categories
///
/// | Category | Variants | Outcome |
/// |----------|----------|---------|
/// | Validation | `InvalidInput`, `UnsupportedOperation` | `fail` (batch never began) |
/// | Constraint | `ConstraintViolation` | `info` |
/// | Contention | `Busy` | `info` |
/// | Transaction | `TransactionNotActive` | `info` |
/// | System | `Io`, `Serialization` | `info` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Error {
    // ==================== Validation Errors ====================
    /// Malformed batch or operand
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the request
        reason: String,
    },

    /// Operation kind not allowed on the table
    #[error("operation '{op}' is not supported on table '{table}'")]
    UnsupportedOperation {
        /// Target table name
        table: String,
        /// Rejected operation kind
        op: String,
    },

    // ==================== Constraint Errors ====================
    /// Constraint violation (duplicate set id, affected-row count, merge type)
    #[error("constraint violation: {reason}")]
    ConstraintViolation {
        /// Which constraint and why
        reason: String,
    },

    // ==================== Contention Errors ====================
    /// Writer lock not acquired within the busy timeout
    #[error("database busy after {waited_ms} ms")]
    Busy {
        /// How long the batch waited for the lock
        waited_ms: u64,
    },

    // ==================== Transaction Errors ====================
    /// Transaction was no longer active
    #[error("transaction not active: {reason}")]
    TransactionNotActive {
        /// Transaction state at the time of the call
        reason: String,
    },

    // ==================== System Errors ====================
    /// I/O error (WAL write, fsync, corruption)
    #[error("I/O error: {reason}")]
    Io {
        /// Underlying failure
        reason: String,
    },

    /// Serialization error
    #[error("serialization error: {reason}")]
    Serialization {
        /// Underlying failure
        reason: String,
    },
}

impl Error {
    /// Build an `InvalidInput` error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }

    /// True for errors raised before any store access
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput { .. } | Error::UnsupportedOperation { .. }
        )
    }

    /// True for writer-lock timeouts
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy { .. })
    }
}
