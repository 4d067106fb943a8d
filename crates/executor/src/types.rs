//! Request and response types for the line protocol.

use mopstore_core::{Mop, MopResult, TableKind};
use serde::{Deserialize, Serialize};

use crate::{BatchOutcome, Error};

/// One batch request: `{"table": "lww", "value": [mops...]}`
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Target table
    pub table: TableKind,
    /// Operations in execution order
    pub value: Vec<Mop>,
}

impl BatchRequest {
    /// Build a request
    pub fn new(table: TableKind, value: Vec<Mop>) -> Self {
        BatchRequest { table, value }
    }

    /// Parse a request from one line of JSON
    pub fn from_json(line: &str) -> crate::Result<Self> {
        serde_json::from_str(line).map_err(|e| Error::invalid_input(format!("malformed request: {}", e)))
    }
}

/// One response line.
///
/// `ok` and `info` mirror [`BatchOutcome`]; `fail` is only produced when the
/// request was rejected before the batch began.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Response {
    /// Batch committed
    Ok {
        /// Per-operation results
        value: Vec<MopResult>,
    },
    /// Batch effect unknown
    Info {
        /// Failure detail
        error: Error,
    },
    /// Batch never began
    Fail {
        /// Validation failure detail
        error: Error,
    },
}

impl Response {
    /// Response for a request rejected before execution
    pub fn fail(error: Error) -> Self {
        Response::Fail { error }
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization {
            reason: e.to_string(),
        })
    }
}

impl From<BatchOutcome> for Response {
    fn from(outcome: BatchOutcome) -> Self {
        match outcome {
            BatchOutcome::Ok { value } => Response::Ok { value },
            BatchOutcome::Info { error } => Response::Info { error },
        }
    }
}

impl From<crate::Result<BatchOutcome>> for Response {
    fn from(result: crate::Result<BatchOutcome>) -> Self {
        match result {
            Ok(outcome) => outcome.into(),
            Err(error) => Response::fail(error),
        }
    }
}
