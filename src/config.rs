// src/config.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::constants::{DEFAULT_PACING_MS, DEFAULT_SEARCH_DEPTH, MAX_SEARCH_DEPTH, MIN_SEARCH_DEPTH};
use crate::error::ConfigError;
use crate::game::evaluation::Evaluator;

/// Search settings for one side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideConfig {
    pub search_depth: u8,
    pub evaluator: Evaluator,
}

impl Default for SideConfig {
    fn default() -> Self {
        Self {
            search_depth: DEFAULT_SEARCH_DEPTH,
            evaluator: Evaluator::default(),
        }
    }
}

impl SideConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_depth(self.search_depth).map(|_| ())
    }
}

pub fn validate_depth(depth: u8) -> Result<u8, ConfigError> {
    if (MIN_SEARCH_DEPTH..=MAX_SEARCH_DEPTH).contains(&depth) {
        Ok(depth)
    } else {
        Err(ConfigError::DepthOutOfRange {
            depth,
            min: MIN_SEARCH_DEPTH,
            max: MAX_SEARCH_DEPTH,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub white: SideConfig,
    pub black: SideConfig,
    pub white_ai_enabled: bool,
    /// Delay before an AI move is applied, in milliseconds.
    pub pacing_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            white: SideConfig::default(),
            black: SideConfig::default(),
            white_ai_enabled: false,
            pacing_ms: DEFAULT_PACING_MS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.white.validate()?;
        self.black.validate()
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

pub fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
    let json = fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}

pub fn save(path: &Path, config: &EngineConfig) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config)?;
    fs::File::create(path)?.write_all(json.as_bytes())?;
    Ok(())
}
