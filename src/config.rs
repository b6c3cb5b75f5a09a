//! Sort configuration
//!
//! Loaded from a JSON file. Every field is optional and defaulted:
//!
//! ```json
//! {
//!   "memory_budget_bytes": 536870912,
//!   "max_top_k": 10000,
//!   "default_strategy": "full",
//!   "log_level": "warn"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds an unusable value
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Strategy used when the planner gives no hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    Full,
    Incremental,
}

/// Tunables for sort execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Max estimated bytes held by one sort (default 512MB)
    #[serde(default = "default_memory_budget")]
    pub memory_budget_bytes: u64,

    /// Largest row limit served by the bounded top-k strategy
    #[serde(default = "default_max_top_k")]
    pub max_top_k: u64,

    /// Strategy when no row limit or partial-consumption hint is known
    #[serde(default = "default_strategy")]
    pub default_strategy: StrategyName,

    /// Minimum severity written by the logger
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_memory_budget() -> u64 {
    512 * 1024 * 1024
}

fn default_max_top_k() -> u64 {
    10_000
}

fn default_strategy() -> StrategyName {
    StrategyName::Full
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: default_memory_budget(),
            max_top_k: default_max_top_k(),
            default_strategy: default_strategy(),
            log_level: default_log_level(),
        }
    }
}

impl SortConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: SortConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.memory_budget_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "memory_budget_bytes",
                reason: "must be > 0".into(),
            });
        }
        if self.max_top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "max_top_k",
                reason: "must be > 0".into(),
            });
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(|reason| ConfigError::Invalid {
                field: "log_level",
                reason,
            })
    }

    /// Memory budget as a container byte limit
    pub fn memory_budget(&self) -> usize {
        usize::try_from(self.memory_budget_bytes).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = SortConfig::from_json("{}").unwrap();
        assert_eq!(config, SortConfig::default());
        assert_eq!(config.memory_budget_bytes, 512 * 1024 * 1024);
        assert_eq!(config.default_strategy, StrategyName::Full);
    }

    #[test]
    fn test_overrides() {
        let config = SortConfig::from_json(
            r#"{"max_top_k": 50, "default_strategy": "incremental", "log_level": "trace"}"#,
        )
        .unwrap();
        assert_eq!(config.max_top_k, 50);
        assert_eq!(config.default_strategy, StrategyName::Incremental);
        assert_eq!(config.severity().unwrap(), Severity::Trace);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let err = SortConfig::from_json(r#"{"memory_budget_bytes": 0}"#).unwrap_err();
        assert!(err.to_string().contains("memory_budget_bytes"));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        assert!(SortConfig::from_json(r#"{"log_level": "chatty"}"#).is_err());
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let err = SortConfig::from_json(r#"{"default_strategy": "bogo"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
