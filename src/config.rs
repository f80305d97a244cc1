//! Configuration for the outline engine

use std::time::Duration;

use serde::Deserialize;

use crate::generators::GeneratorOptions;

/// Default quiet interval before the outline recomputes (1 second)
const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 1000;

/// Engine configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Activity throttle configuration
    pub throttle: ThrottleConfig,
    /// Default options for the bundled generators
    pub generator: GeneratorOptions,
}

/// Activity throttle configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Quiet interval in milliseconds before a settle fires
    pub settle_timeout_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT_MS,
        }
    }
}

impl ThrottleConfig {
    /// Settle timeout as a [`Duration`]
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

impl EngineConfig {
    /// Parse configuration from host initialization options
    pub fn from_init_options(options: Option<serde_json::Value>) -> Self {
        match options {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => Self::default(),
        }
    }
}
