use crate::config::types::{CacheConfig, Config, CrawlerConfig};
use crate::ConfigError;

/// Upper bound on the request permit pool
const MAX_CONCURRENT_REQUESTS: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > MAX_CONCURRENT_REQUESTS
    {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and {}, got {}",
            MAX_CONCURRENT_REQUESTS, config.max_concurrent_requests
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the cache store layout
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.cache_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache_dir cannot be empty".to_string(),
        ));
    }

    if config.temp_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "temp_dir cannot be empty".to_string(),
        ));
    }

    // Held entries would land on top of the live ones.
    if config.cache_dir == config.temp_dir {
        return Err(ConfigError::Validation(format!(
            "temp_dir must differ from cache_dir, both are {}",
            config.cache_dir.display()
        )));
    }

    Ok(())
}
