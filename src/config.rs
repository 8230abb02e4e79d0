//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use crate::runtime::{
    DEFAULT_EPSILON_LIMIT, DEFAULT_INITIAL_STATE, DEFAULT_PREDICT_EVENT, DriverOptions,
};
use crate::runtime::history::DEFAULT_HISTORY_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transition-engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Initial-state label used when a load does not name one
    #[serde(default = "default_initial_state")]
    pub initial_state: String,

    /// Transition history ring capacity
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Epsilon-closure step limit
    #[serde(default = "default_epsilon_limit")]
    pub epsilon_limit: usize,

    /// Guard type whose argument literals form the predicted-input set
    #[serde(default = "default_predict_event")]
    pub predict_event: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

// Default value functions

fn default_initial_state() -> String {
    DEFAULT_INITIAL_STATE.to_string()
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_epsilon_limit() -> usize {
    DEFAULT_EPSILON_LIMIT
}

fn default_predict_event() -> String {
    DEFAULT_PREDICT_EVENT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_state: default_initial_state(),
            history_capacity: default_history_capacity(),
            epsilon_limit: default_epsilon_limit(),
            predict_event: default_predict_event(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./dialog-fst.toml
    /// 2. ~/.dialog-fst/config.toml
    /// 3. /etc/dialog-fst/config.toml
    pub fn load() -> Result<Self> {
        let paths = vec![
            PathBuf::from("dialog-fst.toml"),
            dirs::home_dir()
                .map(|h| h.join(".dialog-fst").join("config.toml"))
                .unwrap_or_else(|| PathBuf::from("/dev/null")),
            PathBuf::from("/etc/dialog-fst/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Runtime options derived from the engine section
    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            initial_state: self.engine.initial_state.clone(),
            history_capacity: self.engine.history_capacity,
            epsilon_limit: self.engine.epsilon_limit,
            predict_event_type: self.engine.predict_event.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.initial_state, "0");
        assert_eq!(config.engine.history_capacity, 128);
        assert_eq!(config.engine.predict_event, "RECOG_EVENT_STOP");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[engine]
initial_state = "START"
history_capacity = 64

[logging]
level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.initial_state, "START");
        assert_eq!(config.engine.history_capacity, 64);
        // unset fields keep their defaults
        assert_eq!(config.engine.epsilon_limit, 4096);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_driver_options_follow_config() {
        let mut config = Config::default();
        config.engine.initial_state = "S".to_string();
        config.engine.history_capacity = 7;

        let opts = config.driver_options();
        assert_eq!(opts.initial_state, "S");
        assert_eq!(opts.history_capacity, 7);
    }
}
