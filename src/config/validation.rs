use crate::config::types::{
    Config, DetailsConfig, DiscoveryConfig, HttpConfig, IdentityConfig, PacingConfig,
    SelectorsConfig,
};
use crate::ConfigError;
use reqwest::header::HeaderValue;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Upper bound on any worker pool
const MAX_POOL_SIZE: usize = 100;

/// Minimum number of distinct user agents in the rotation pool
const MIN_USER_AGENTS: usize = 3;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_pacing_config(&config.pacing)?;
    validate_identity_config(&config.identity)?;
    validate_discovery_config(&config.discovery)?;
    validate_details_config(&config.details)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.connect_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    validate_range(
        "attempt delay",
        config.attempt_delay_min_ms,
        config.attempt_delay_max_ms,
    )?;
    validate_range(
        "retry delay",
        config.retry_delay_min_ms,
        config.retry_delay_max_ms,
    )
}

fn validate_range(name: &str, min: u64, max: u64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} minimum ({}ms) exceeds its maximum ({}ms)",
            name, min, max
        )));
    }
    Ok(())
}

fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.user_agents.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents must not contain blank entries".to_string(),
        ));
    }

    let distinct: HashSet<&str> = config
        .user_agents
        .iter()
        .map(|agent| agent.trim())
        .filter(|agent| !agent.is_empty())
        .collect();

    if distinct.len() < MIN_USER_AGENTS {
        return Err(ConfigError::Validation(format!(
            "user_agents must contain at least {} distinct entries, got {}",
            MIN_USER_AGENTS,
            distinct.len()
        )));
    }

    let headers = config
        .user_agents
        .iter()
        .map(|agent| ("user-agent", agent.as_str()))
        .chain([
            ("accept", config.accept.as_str()),
            ("accept-language", config.accept_language.as_str()),
            ("connection", config.connection.as_str()),
        ]);

    for (name, value) in headers {
        validate_header_value(name, value)?;
    }

    Ok(())
}

fn validate_header_value(name: &str, value: &str) -> Result<(), ConfigError> {
    HeaderValue::from_str(value).map(|_| ()).map_err(|_| {
        ConfigError::Validation(format!("Invalid value for header {}: '{}'", name, value))
    })
}

fn validate_pool(stage: &str, pool_size: usize, retry_pool_size: usize) -> Result<(), ConfigError> {
    for (name, size) in [("pool_size", pool_size), ("retry_pool_size", retry_pool_size)] {
        if size < 1 || size > MAX_POOL_SIZE {
            return Err(ConfigError::Validation(format!(
                "{}.{} must be between 1 and {}, got {}",
                stage, name, MAX_POOL_SIZE, size
            )));
        }
    }
    Ok(())
}

fn validate_budget(
    stage: &str,
    max_attempts: u32,
    retry_max_attempts: u32,
    max_rounds: u32,
) -> Result<(), ConfigError> {
    for (name, value) in [
        ("max_attempts", max_attempts),
        ("retry_max_attempts", retry_max_attempts),
        ("max_rounds", max_rounds),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{}.{} must be >= 1",
                stage, name
            )));
        }
    }
    Ok(())
}

fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if let Some(referer) = &config.referer {
        validate_header_value("referer", referer)?;
    }

    if config.first_page < 1 || config.first_page > config.last_page {
        return Err(ConfigError::Validation(format!(
            "page range must satisfy 1 <= first_page <= last_page, got {}..={}",
            config.first_page, config.last_page
        )));
    }

    if config.output_path.is_empty() {
        return Err(ConfigError::Validation(
            "discovery.output_path cannot be empty".to_string(),
        ));
    }

    validate_pool("discovery", config.pool_size, config.retry_pool_size)?;
    validate_budget(
        "discovery",
        config.max_attempts,
        config.retry_max_attempts,
        config.max_rounds,
    )
}

fn validate_details_config(config: &DetailsConfig) -> Result<(), ConfigError> {
    if config.input_path.is_empty() {
        return Err(ConfigError::Validation(
            "details.input_path cannot be empty".to_string(),
        ));
    }

    if config.output_path.is_empty() {
        return Err(ConfigError::Validation(
            "details.output_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.failed_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "details.failed_path cannot be empty when set".to_string(),
        ));
    }

    validate_header_value("referer", &config.referer)?;
    validate_pool("details", config.pool_size, config.retry_pool_size)?;
    validate_budget(
        "details",
        config.max_attempts,
        config.retry_max_attempts,
        config.max_rounds,
    )
}

fn validate_selectors(config: &SelectorsConfig) -> Result<(), ConfigError> {
    let listing = &config.listing;
    let product = &config.product;

    for selector in [
        &listing.item,
        &listing.category,
        &listing.link,
        &product.name,
        &product.description,
        &product.attribute_row,
        &product.attribute_label,
        &product.attribute_value,
    ] {
        Selector::parse(selector).map_err(|e| {
            ConfigError::Validation(format!("Invalid selector '{}': {:?}", selector, e))
        })?;
    }

    if listing.category_attribute.is_empty() {
        return Err(ConfigError::Validation(
            "selectors.listing.category_attribute cannot be empty".to_string(),
        ));
    }

    Ok(())
}
