//! Size limits that drive representation selection

use crate::error::{messages, ConfigField, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::rc::Rc;

/// Largest item count a transition shape may hold
pub const DEFAULT_TRANSITION_MAX_SIZE: usize = 48;

/// Item counts above this use a hash index for lookups
pub const DEFAULT_INDEX_THRESHOLD: usize = 96;

/// Edge counts above this move a transition table into a hash map
pub const DEFAULT_TRANSITION_TABLE_MAP_THRESHOLD: usize = 8;

/// Shape engine configuration
///
/// A root shape carries its configuration and every shape derived from it
/// shares the same `Rc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Largest item count a transition shape may hold
    pub transition_max_size: usize,
    /// Item counts above this use an indexed shape
    pub index_threshold: usize,
    /// Edge counts above this migrate a transition table to a hash map
    pub transition_table_map_threshold: usize,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            transition_max_size: DEFAULT_TRANSITION_MAX_SIZE,
            index_threshold: DEFAULT_INDEX_THRESHOLD,
            transition_table_map_threshold: DEFAULT_TRANSITION_TABLE_MAP_THRESHOLD,
        }
    }
}

thread_local! {
    static DEFAULT_CONFIG: Rc<ShapeConfig> = Rc::new(ShapeConfig::default());
}

impl ShapeConfig {
    /// The thread's shared default configuration
    pub fn shared_default() -> Rc<ShapeConfig> {
        DEFAULT_CONFIG.with(Rc::clone)
    }

    /// Check that every limit is usable
    ///
    /// A transition shape that outgrows the index threshold would skip the
    /// linear representation entirely, so that ordering is required too.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            (ConfigField::TransitionMaxSize, self.transition_max_size),
            (ConfigField::IndexThreshold, self.index_threshold),
            (
                ConfigField::TransitionTableMapThreshold,
                self.transition_table_map_threshold,
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(Error::config_error(field, messages::MUST_BE_POSITIVE));
            }
        }

        if self.transition_max_size > self.index_threshold {
            return Err(Error::config_error(
                ConfigField::TransitionMaxSize,
                messages::must_not_exceed("transition_max_size", "index_threshold"),
            ));
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration
    ///
    /// Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ShapeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
