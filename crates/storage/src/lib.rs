//! Storage layer for mopstore
//!
//! This crate implements committed-state storage for the three tables:
//! - TableStore: BTreeMap-based tables behind one RwLock
//! - KeyIndex: set key → member ids, for per-key set reads
//! - Version and set-id high-water marks with AtomicU64
//!
//! Uncommitted state never reaches this crate; transactions buffer their
//! writes and hand them over in one `apply_batch` call at commit.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod table_store;

pub use index::KeyIndex;
pub use table_store::{SetMember, TableStore};
