//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Knobs for a traversal session.
///
/// Every key is optional when loading from TOML:
///
/// ```toml
/// start_marker = "@start"
/// max_auto_steps = 256
/// strict_start = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Token searched for in node text or expression to find the entry point.
    pub start_marker: String,

    /// Upper bound on automatic transitions (jumps, containers, conditions)
    /// resolved for a single trigger.
    pub max_auto_steps: usize,

    /// Treat more than one start marker as an error. When off, a warning is
    /// logged and the first marked node in document order is used.
    pub strict_start: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_marker: "@start".to_string(),
            max_auto_steps: 256,
            strict_start: true,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_auto_steps == 0 {
            return Err(ConfigError::ZeroStepBudget);
        }
        if self.start_marker.trim().is_empty() {
            return Err(ConfigError::EmptyStartMarker);
        }
        Ok(())
    }

    pub fn with_start_marker(mut self, marker: impl Into<String>) -> Self {
        self.start_marker = marker.into();
        self
    }

    pub fn with_max_auto_steps(mut self, steps: usize) -> Self {
        self.max_auto_steps = steps;
        self
    }

    pub fn with_strict_start(mut self, strict: bool) -> Self {
        self.strict_start = strict;
        self
    }
}
