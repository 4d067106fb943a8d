//! # mopstore executor
//!
//! The public API of mopstore: an atomic micro-operation batch executor over
//! a durable record store.
//!
//! This is the only crate users need to import. It provides:
//! - [`Executor`] - validates and runs a batch as one atomic unit
//! - [`BatchOutcome`] - `ok` with per-operation results, or `info` when the
//!   effect is unknown
//! - [`BatchRequest`]/[`Response`] - the JSON line protocol shapes
//!
//! ## Quick Start
//!
//! ```text
//! use mopstore_executor::{Database, Executor, Mop, TableKind};
//!
//! let executor = Executor::new(Database::open("/path/to/data")?);
//! let outcome = executor.execute_batch(
//!     TableKind::Append,
//!     &[Mop::append(1, "x"), Mop::read(1)],
//! )?;
//! ```
//!
//! ## Tables
//!
//! | Table | Operations | Merge |
//! |-------|------------|-------|
//! | `lww` | `r`, `w` | overwrite |
//! | `append` | `r`, `append` | space-joined tokens |
//! | `set` | `r`, `append` | insert-only members |

#![warn(missing_docs)]

mod convert;
mod error;
mod executor;
mod outcome;
mod types;
mod validate;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API - Everything users need is re-exported here
// =============================================================================

pub use convert::convert_result;
pub use error::Error;
pub use executor::Executor;
pub use outcome::{classify, BatchOutcome};
pub use types::{BatchRequest, Response};
pub use validate::{allowed_kinds, validate_batch};

// Re-export core types so users don't need mopstore_core directly
pub use mopstore_core::{Key, Mop, MopKind, MopResult, Row, RowId, TableKind, Value};

// Re-export engine types so users don't need mopstore_engine directly
pub use mopstore_engine::{Database, DurabilityMode, MopStoreConfig, StoreProperties};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
