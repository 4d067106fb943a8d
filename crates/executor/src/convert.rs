//! Error conversion from internal error types.
//!
//! This module provides conversions from [`StoreError`] to the executor's
//! [`Error`] type.

use crate::Error;
use mopstore_core::StoreError;

/// Convert a StoreError to an executor Error.
///
/// This preserves all error details while mapping to the appropriate
/// executor error variant.
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            // Validation errors
            StoreError::InvalidInput { reason } => Error::InvalidInput { reason },

            // Constraint errors
            StoreError::ConstraintViolation { reason } => Error::ConstraintViolation { reason },

            // Contention
            StoreError::Busy { waited_ms } => Error::Busy { waited_ms },

            // Transaction state
            StoreError::TransactionNotActive { txn_id, state } => Error::TransactionNotActive {
                reason: format!("transaction {} is {}", txn_id, state),
            },

            // System errors
            StoreError::Io(e) => Error::Io {
                reason: e.to_string(),
            },

            StoreError::Storage(message) => Error::Io { reason: message },

            StoreError::Corruption(message) => Error::Io {
                reason: format!("Data corruption: {}", message),
            },

            StoreError::IncompleteEntry {
                offset,
                have,
                needed,
            } => Error::Io {
                reason: format!(
                    "Incomplete entry at offset {}: have {} bytes, need {}",
                    offset, have, needed
                ),
            },

            StoreError::Serialization(message) => Error::Serialization { reason: message },
        }
    }
}

/// Convert a mopstore_core::StoreResult to an executor Result.
pub fn convert_result<T>(result: mopstore_core::StoreResult<T>) -> crate::Result<T> {
    result.map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_busy() {
        let converted: Error = StoreError::busy(250).into();
        assert_eq!(converted, Error::Busy { waited_ms: 250 });
        assert!(converted.is_busy());
    }

    #[test]
    fn test_constraint() {
        let converted: Error = StoreError::constraint("duplicate set member id 3").into();
        match converted {
            Error::ConstraintViolation { reason } => assert!(reason.contains("id 3")),
            _ => panic!("Expected ConstraintViolation"),
        }
    }

    #[test]
    fn test_invalid_input_is_validation() {
        let converted: Error = StoreError::invalid_input("bad").into();
        assert!(converted.is_validation());
    }

    #[test]
    fn test_io_keeps_message() {
        let err = StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk full"));
        match Error::from(err) {
            Error::Io { reason } => assert!(reason.contains("disk full")),
            _ => panic!("Expected Io"),
        }
    }

    #[test]
    fn test_corruption_maps_to_io() {
        match Error::from(StoreError::corruption("crc mismatch")) {
            Error::Io { reason } => {
                assert!(reason.contains("corruption"));
                assert!(reason.contains("crc mismatch"));
            }
            _ => panic!("Expected Io"),
        }
    }

    #[test]
    fn test_transaction_not_active() {
        let err = StoreError::TransactionNotActive {
            txn_id: 9,
            state: "Committed".to_string(),
        };
        match Error::from(err) {
            Error::TransactionNotActive { reason } => {
                assert!(reason.contains('9'));
                assert!(reason.contains("Committed"));
            }
            _ => panic!("Expected TransactionNotActive"),
        }
    }

    #[test]
    fn test_convert_result() {
        let ok: crate::Result<u8> = convert_result(Ok(1));
        assert_eq!(ok, Ok(1));
        let err: crate::Result<u8> = convert_result(Err(StoreError::storage("wal")));
        assert!(matches!(err, Err(Error::Io { .. })));
    }
}
