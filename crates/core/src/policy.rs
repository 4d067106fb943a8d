//! Merge policies
//!
//! Each table combines an incoming value with the stored one in a fixed way.
//! The policy is pure and knows nothing about storage: it is handed the prior
//! value (if any) and returns the value to store.

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::value::Value;

/// Token separator for the append policy
pub const SEPARATOR: &str = " ";

/// How an incoming value combines with a stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Discard the prior value
    Overwrite,
    /// Concatenate the token onto the prior value with [`SEPARATOR`]
    Append,
    /// No combination; every insertion is an independent row
    Insert,
}

impl MergePolicy {
    /// Compute the value to store
    ///
    /// For [`MergePolicy::Append`], integer tokens are rendered as decimal
    /// text and the stored value is always a string. List tokens, and
    /// list-valued priors, are rejected.
    pub fn combine(&self, prior: Option<&Value>, incoming: &Value) -> StoreResult<Value> {
        match self {
            MergePolicy::Overwrite | MergePolicy::Insert => Ok(incoming.clone()),
            MergePolicy::Append => {
                let token = token_text(incoming)?;
                match prior {
                    None => Ok(Value::String(token)),
                    Some(prior) => {
                        let mut merged = token_text(prior)?;
                        merged.push_str(SEPARATOR);
                        merged.push_str(&token);
                        Ok(Value::String(merged))
                    }
                }
            }
        }
    }

    /// True if the policy needs the prior value
    pub fn reads_prior(&self) -> bool {
        matches!(self, MergePolicy::Append)
    }
}

fn token_text(value: &Value) -> StoreResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        Value::List(_) => Err(StoreError::constraint(
            "append merges text tokens, got a list",
        )),
    }
}
