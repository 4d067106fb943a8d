//! Outcome classification.
//!
//! A batch that began either committed (`ok`) or its effect is unknown
//! (`info`). There is no definite-failure case here: once the atomic unit
//! has started, a failure cannot prove that nothing happened.

use mopstore_core::MopResult;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Client-visible result of a batch that began.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchOutcome {
    /// Every operation succeeded and the unit committed
    Ok {
        /// Per-operation results in submission order
        value: Vec<MopResult>,
    },
    /// The unit failed; its effect must be treated as unknown
    Info {
        /// The failure that aborted the unit
        error: Error,
    },
}

impl BatchOutcome {
    /// True for `ok`
    pub fn is_ok(&self) -> bool {
        matches!(self, BatchOutcome::Ok { .. })
    }

    /// True for `info`
    pub fn is_info(&self) -> bool {
        matches!(self, BatchOutcome::Info { .. })
    }

    /// Results of an `ok` outcome
    pub fn results(&self) -> Option<&[MopResult]> {
        match self {
            BatchOutcome::Ok { value } => Some(value),
            BatchOutcome::Info { .. } => None,
        }
    }

    /// Error of an `info` outcome
    pub fn error(&self) -> Option<&Error> {
        match self {
            BatchOutcome::Ok { .. } => None,
            BatchOutcome::Info { error } => Some(error),
        }
    }
}

/// Map the result of an executed batch onto its outcome.
pub fn classify(result: Result<Vec<MopResult>>) -> BatchOutcome {
    match result {
        Ok(value) => BatchOutcome::Ok { value },
        Err(error) => BatchOutcome::Info { error },
    }
}
