//! Store configuration.
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Default hash collection that holds person records.
pub const DEFAULT_COLLECTION: &str = "persons";

/// How `update` treats an id that is not stored yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Missing ids fail with `NotFound` and nothing is written.
    #[default]
    Strict,
    /// Missing ids are silently created (legacy client behavior).
    Upsert,
}

/// How `list` selects a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Ask the backend for the window directly.
    #[default]
    Ranged,
    /// Read the whole collection and slice it in memory.
    FullScan,
}

/// How `list` reacts to a stored value that fails to deserialize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptEntryPolicy {
    /// Fail the whole page.
    #[default]
    Abort,
    /// Drop the entry from the page and log a warning.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default)]
    pub update_mode: UpdateMode,

    #[serde(default)]
    pub pagination: PaginationMode,

    #[serde(default)]
    pub corrupt_entries: CorruptEntryPolicy,

    /// Upper bound for one backend command waiting on a locked store.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            update_mode: UpdateMode::default(),
            pagination: PaginationMode::default(),
            corrupt_entries: CorruptEntryPolicy::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    EmptyCollection,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::EmptyCollection => write!(f, "config `collection` cannot be empty"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::EmptyCollection => None,
        }
    }
}

impl StoreConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.trim().is_empty() {
            return Err(ConfigError::EmptyCollection);
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
