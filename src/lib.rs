//! mopstore - durable micro-operation transaction store
//!
//! mopstore executes ordered batches of read / write / append operations
//! against integer-keyed records as single atomic units, under one of three
//! conflict-resolution policies: last-writer-wins overwrite (`lww`),
//! last-writer-wins append/merge (`append`) and insert-only growable set
//! (`set`).
//!
//! # Quick Start
//!
//! ```ignore
//! use mopstore::{Database, Executor, Mop, TableKind};
//!
//! let executor = Executor::new(Database::ephemeral());
//! let outcome = executor.execute_batch(
//!     TableKind::Append,
//!     &[Mop::read(1), Mop::append(1, "x"), Mop::read(1)],
//! )?;
//! assert!(outcome.is_ok());
//! ```
//!
//! # Architecture
//!
//! All batches go through the [`Executor`], which validates them, runs them
//! inside one transaction of the [`Database`] and classifies the result as
//! `ok` or `info`.
//!
//! Internal implementation details (storage, concurrency, durability, engine)
//! are not exposed - only the executor API is public.

// Re-export the public API from mopstore-executor
pub use mopstore_executor::*;
