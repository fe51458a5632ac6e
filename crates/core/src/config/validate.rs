use super::{types::Config, ConfigError, ProviderConfig};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Cache capacity is not 0
/// - Every provider polls at least once and has a non-empty base URL override
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.cache.capacity == 0 {
        return Err(ConfigError::ValidationError(
            "cache.capacity cannot be 0".to_string(),
        ));
    }

    let providers = [
        ("realdebrid", &config.providers.realdebrid),
        ("alldebrid", &config.providers.alldebrid),
        ("torbox", &config.providers.torbox),
    ];
    for (name, provider) in providers {
        validate_provider(name, provider)?;
    }

    Ok(())
}

fn validate_provider(name: &str, config: &ProviderConfig) -> Result<(), ConfigError> {
    if config.max_poll_attempts == 0 {
        return Err(ConfigError::ValidationError(format!(
            "providers.{}.max_poll_attempts cannot be 0",
            name
        )));
    }
    if let Some(url) = &config.base_url {
        if url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "providers.{}.base_url cannot be empty",
                name
            )));
        }
    }
    Ok(())
}
