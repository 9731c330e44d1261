use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineConfig;
use crate::provider::GoogleBooksConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub provider: GoogleBooksConfig,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bookstack.db")
}

/// Pipeline tuning overrides. Only the operationally interesting knobs are
/// exposed; budgets and targets keep their built-in values.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineSection {
    /// Staleness TTL in days.
    #[serde(default = "default_ttl_days")]
    pub cache_ttl_days: u32,
    /// Max retained search cache entries (0 disables eviction).
    #[serde(default = "default_search_cache_cap")]
    pub search_cache_cap: u32,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            cache_ttl_days: default_ttl_days(),
            search_cache_cap: default_search_cache_cap(),
        }
    }
}

fn default_ttl_days() -> u32 {
    7
}

fn default_search_cache_cap() -> u32 {
    256
}

impl PipelineSection {
    /// Expand into the full pipeline config.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            cache_ttl_ms: i64::from(self.cache_ttl_days) * 24 * 60 * 60 * 1000,
            search_cache_cap: self.search_cache_cap,
            ..PipelineConfig::default()
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, PathBuf::from("bookstack.db"));
        assert_eq!(config.pipeline.cache_ttl_days, 7);
        assert_eq!(config.pipeline.search_cache_cap, 256);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_to_pipeline_config() {
        let section = PipelineSection {
            cache_ttl_days: 2,
            search_cache_cap: 10,
        };
        let pipeline = section.to_pipeline_config();
        assert_eq!(pipeline.cache_ttl_ms, 2 * 24 * 60 * 60 * 1000);
        assert_eq!(pipeline.search_cache_cap, 10);
        // Built-in budgets untouched
        assert_eq!(pipeline.category_detail_budget, 20);
    }
}
