//! Database configuration via `mopstore.toml`
//!
//! A default `mopstore.toml` is created in the data directory on first open.
//! To change settings, edit the file and restart.

use mopstore_core::{StoreError, StoreResult};
use mopstore_durability::DurabilityMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "mopstore.toml";

/// Default writer-lock wait in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Database configuration loaded from `mopstore.toml`.
///
/// # Example
///
/// ```toml
/// durability = "standard"
/// busy_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MopStoreConfig {
    /// Durability mode: `"standard"`, `"always"` or `"none"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
    /// How long a batch waits for the writer lock before failing as busy.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_durability_str() -> String {
    "standard".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for MopStoreConfig {
    fn default() -> Self {
        Self {
            durability: default_durability_str(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl MopStoreConfig {
    /// Config with the given durability mode and default busy timeout.
    pub fn with_durability(mode: DurabilityMode) -> Self {
        Self {
            durability: mode.name().to_string(),
            ..Self::default()
        }
    }

    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"standard"`, `"always"` or `"none"`.
    pub fn durability_mode(&self) -> StoreResult<DurabilityMode> {
        self.durability.parse::<DurabilityMode>().map_err(|_| {
            StoreError::invalid_input(format!(
                "Invalid durability mode '{}' in {}. Expected \"standard\", \"always\" or \"none\".",
                self.durability, CONFIG_FILE_NAME
            ))
        })
    }

    /// Writer-lock busy timeout.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# mopstore configuration
#
# Durability mode: "standard" (default), "always" or "none"
#   "standard" = batched fsync (~100ms), may lose the last interval on power loss
#   "always"   = fsync every commit, zero data loss
#   "none"     = no WAL, nothing survives a restart
durability = "standard"

# How long a batch waits for the writer lock before it fails as busy
# (reported to the client as an indeterminate "info" outcome).
busy_timeout_ms = 5000
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::storage(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: MopStoreConfig = toml::from_str(&content).map_err(|e| {
            StoreError::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        // Validate the durability value eagerly
        config.durability_mode()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> StoreResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::storage(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::storage(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::storage(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
