// Path: crates/types/src/config/mod.rs

//! Shared configuration structures for Tessera components.
use serde::{Deserialize, Serialize};

/// Limits applied by the world and its call router.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorldConfig {
    /// Maximum depth of nested system calls, counting the top-level call.
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Maximum number of calls in one `batch_call`.
    #[serde(default = "default_max_batch_calls")]
    pub max_batch_calls: usize,
}

fn default_max_call_depth() -> usize {
    32
}
fn default_max_batch_calls() -> usize {
    256
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_call_depth: default_max_call_depth(),
            max_batch_calls: default_max_batch_calls(),
        }
    }
}

/// Settings for an event log consumer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReplicatorConfig {
    /// Maximum number of events fetched and applied per batch.
    #[serde(default = "default_batch_events_max")]
    pub batch_events_max: usize,
    /// Interval between polls when no notification arrives, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Apply events for distinct keys in parallel.
    #[serde(default)]
    pub parallel_apply: bool,
}

fn default_batch_events_max() -> usize {
    1000
}
fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for ReplicatorConfig {
    fn default() -> Self {
        Self {
            batch_events_max: default_batch_events_max(),
            poll_interval_ms: default_poll_interval_ms(),
            parallel_apply: false,
        }
    }
}

/// Top-level configuration, as loaded from a TOML file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct TesseraConfig {
    /// World and router limits.
    #[serde(default)]
    pub world: WorldConfig,
    /// Replicator settings.
    #[serde(default)]
    pub replicator: ReplicatorConfig,
}

impl TesseraConfig {
    /// Parses a configuration from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
