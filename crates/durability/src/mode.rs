//! Durability mode configuration
//!
//! Controls WAL sync behavior (None, Standard, Always).

use mopstore_core::StoreError;
use std::fmt;
use std::str::FromStr;

/// Durability mode for WAL operations
///
/// # Modes
///
/// | Mode | fsync | Data Loss Window |
/// |------|-------|-----------------|
/// | None | Never (no WAL) | Everything |
/// | Always | Every commit | Zero |
/// | Standard | Periodic | Up to interval/batch |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// In-memory only: no WAL file, nothing survives a restart
    None,

    /// fsync after every commit
    Always,

    /// fsync every N commits OR every T milliseconds (the default)
    ///
    /// May lose up to `batch_size` commits or `interval_ms` of data on
    /// power loss. Commits are always written to the OS before they
    /// become visible, so a process crash loses nothing.
    Standard {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode requires WAL persistence
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Configuration name of the mode
    pub fn name(&self) -> &'static str {
        match self {
            DurabilityMode::None => "none",
            DurabilityMode::Always => "always",
            DurabilityMode::Standard { .. } => "standard",
        }
    }

    /// Standard mode with `interval_ms: 100, batch_size: 1000`
    pub fn standard_default() -> Self {
        DurabilityMode::Standard {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::standard_default()
    }
}

impl fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DurabilityMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DurabilityMode::None),
            "always" => Ok(DurabilityMode::Always),
            "standard" => Ok(DurabilityMode::standard_default()),
            other => Err(StoreError::invalid_input(format!(
                "unknown durability mode '{}', expected one of: none, standard, always",
                other
            ))),
        }
    }
}
