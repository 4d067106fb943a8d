//! End-to-end correctness tests.
//!
//! These tests drive batches through the public facade and check the
//! guarantees a correctness checker relies on: atomicity, merge order,
//! read-your-own-writes, the ok/info split, and durability across reopen.

#[path = "../common/mod.rs"]
mod common;

mod atomicity;
mod contention;
mod merge_semantics;
mod recovery;
mod scenarios;
