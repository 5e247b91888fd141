//! Configuration for a tracker instance.

use serde::{Deserialize, Serialize};

use crate::{BlockHash, Result, TrackerError, constants};

/// Tracker configuration.
///
/// Every field has a default, so a partial JSON document is enough:
/// `{"initial_finalized": "0xabc"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Starting finalization cursor. `None` means the implicit genesis: the
    /// first ancestor walk stops at the first parent the tracker never saw.
    pub initial_finalized: Option<BlockHash>,
    /// Maximum number of blocks walked back per `finalized` event.
    pub max_chain_walk: usize,
    /// Capacity of the released-block tombstone cache.
    pub released_cache_size: usize,
    /// Capacity of the completed/orphaned transaction tombstone cache.
    pub retired_cache_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            initial_finalized: None,
            max_chain_walk: constants::DEFAULT_MAX_CHAIN_WALK,
            released_cache_size: constants::DEFAULT_RELEASED_CACHE_SIZE,
            retired_cache_size: constants::DEFAULT_RETIRED_CACHE_SIZE,
        }
    }
}

impl TrackerConfig {
    /// Start from an already-finalized block instead of genesis.
    #[must_use]
    pub fn with_initial_finalized(mut self, block_hash: impl Into<BlockHash>) -> Self {
        self.initial_finalized = Some(block_hash.into());
        self
    }

    /// Parse a JSON configuration document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the tracker cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_chain_walk == 0 {
            return Err(TrackerError::Configuration(
                "max_chain_walk must be > 0".to_string(),
            ));
        }
        if self.released_cache_size == 0 {
            return Err(TrackerError::Configuration(
                "released_cache_size must be > 0".to_string(),
            ));
        }
        if self.retired_cache_size == 0 {
            return Err(TrackerError::Configuration(
                "retired_cache_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
