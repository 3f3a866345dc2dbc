use crate::config::types::CrawlConfig;
use crate::ConfigError;

/// Validates the entire configuration
///
/// Invalid values are rejected, never clamped. Error messages name the
/// offending TOML key.
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    // The negated comparison also rejects NaN.
    if !(config.crawl_delay >= 0.5) {
        return Err(ConfigError::Validation(format!(
            "crawl-delay must be >= 0.5 seconds, got {}",
            config.crawl_delay
        )));
    }

    if config.max_concurrent_crawls < 1 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-crawls must be >= 1, got {}",
            config.max_concurrent_crawls
        )));
    }

    if config.fetch_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout must be >= 1 second, got {}",
            config.fetch_timeout
        )));
    }

    Ok(())
}
