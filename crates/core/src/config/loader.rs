use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("BOOKSTACK_").split("_"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject configurations the pipeline cannot run with.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pipeline.cache_ttl_days == 0 {
        return Err(ConfigError::Invalid(
            "pipeline.cache_ttl_days must be at least 1".to_string(),
        ));
    }
    if let Some(base_url) = &config.provider.base_url {
        if base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "provider.base_url must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}
