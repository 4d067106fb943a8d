//! Database engine for mopstore
//!
//! This crate orchestrates all lower layers:
//! - Database: main database struct with open/close and `mopstore.toml`
//! - Transaction coordination and metrics
//! - Recovery integration
//! - Properties report
//!
//! The engine is the only component that knows about:
//! - The data directory layout
//! - Cross-layer coordination (storage + WAL + recovery)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod database;
pub mod properties;

pub use coordinator::{TransactionCoordinator, TransactionMetrics};
pub use database::{Database, MopStoreConfig, CONFIG_FILE_NAME, DEFAULT_BUSY_TIMEOUT_MS};
pub use properties::{RowCounts, StoreProperties};

pub use mopstore_concurrency::TransactionContext;
pub use mopstore_durability::DurabilityMode;
