//! Micro-operations and their results
//!
//! A [`Mop`] is one primitive operation of a batch: `{f, k, v?, id?}` where
//! `f` is `"r"`, `"w"` or `"append"`. Unknown fields on the wire are ignored.
//! A [`MopResult`] mirrors the operation and always carries `v` (which is
//! `null` for a read of an absent key).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Key, RowId};
use crate::value::Value;

/// Operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MopKind {
    /// Read the current value
    #[serde(rename = "r")]
    Read,
    /// Overwrite the value
    #[serde(rename = "w")]
    Write,
    /// Merge a token onto the value, or insert a set member
    #[serde(rename = "append")]
    Append,
}

impl MopKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MopKind::Read => "r",
            MopKind::Write => "w",
            MopKind::Append => "append",
        }
    }

    /// True for kinds that mutate state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, MopKind::Read)
    }
}

impl fmt::Display for MopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single micro-operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mop {
    /// Operation kind
    pub f: MopKind,
    /// Record key
    pub k: Key,
    /// Operand (required for `w` and `append`, absent for `r`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<Value>,
    /// Explicit set-member identity (set table `append` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
}

impl Mop {
    /// Read `k`
    pub fn read(k: Key) -> Self {
        Mop {
            f: MopKind::Read,
            k,
            v: None,
            id: None,
        }
    }

    /// Overwrite `k` with `v`
    pub fn write(k: Key, v: impl Into<Value>) -> Self {
        Mop {
            f: MopKind::Write,
            k,
            v: Some(v.into()),
            id: None,
        }
    }

    /// Append `v` to `k`
    pub fn append(k: Key, v: impl Into<Value>) -> Self {
        Mop {
            f: MopKind::Append,
            k,
            v: Some(v.into()),
            id: None,
        }
    }

    /// Attach an explicit set-member identity
    pub fn with_id(mut self, id: RowId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Result of one micro-operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MopResult {
    /// Operation kind, echoed
    pub f: MopKind,
    /// Record key, echoed
    pub k: Key,
    /// Observed value for reads, supplied value for mutations
    #[serde(default)]
    pub v: Option<Value>,
}

impl MopResult {
    /// Result of a read that observed `v`
    pub fn read(k: Key, v: Option<Value>) -> Self {
        MopResult {
            f: MopKind::Read,
            k,
            v,
        }
    }

    /// Echo of a mutation
    pub fn echo(mop: &Mop) -> Self {
        MopResult {
            f: mop.f,
            k: mop.k,
            v: mop.v.clone(),
        }
    }
}
