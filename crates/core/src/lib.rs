//! Core types and traits for mopstore
//!
//! This crate defines the foundational types used throughout the system:
//! - Key / RowId: record and set-member identities
//! - TableKind: the three logical tables (lww register, append register, growable set)
//! - Value: storable value enum
//! - Mop / MopResult: micro-operations and their per-operation results
//! - MergePolicy: how an incoming value combines with a stored one
//! - StoreError: error type hierarchy
//! - Storage: committed-state storage abstraction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod mop;
pub mod policy;
pub mod traits;
pub mod types;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use mop::{Mop, MopKind, MopResult};
pub use policy::{MergePolicy, SEPARATOR};
pub use traits::Storage;
pub use types::{Key, Row, RowId, TableKind, VersionedValue, Write};
pub use value::Value;
