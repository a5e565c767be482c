use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use catalog_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Detail workers: {}", config.details.pool_size);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so output files can be traced back to the
/// configuration that produced them.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[http]
request-timeout-ms = 2500

[pacing]
attempt-delay-min-ms = 0
attempt-delay-max-ms = 10
retry-delay-min-ms = 20
retry-delay-max-ms = 30

[discovery]
base-url = "https://shop.example.com/listing.html"
first-page = 2
last-page = 4
output-path = "./links.csv"
pool-size = 4

[details]
input-path = "./links.csv"
output-path = "./details.csv"
failed-path = "./failed.csv"
max-attempts = 5

[selectors.product]
name = "h1.title"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.http.request_timeout_ms, 2500);
        assert_eq!(config.pacing.retry_delay_max_ms, 30);
        assert_eq!(config.discovery.first_page, 2);
        assert_eq!(config.discovery.pool_size, 4);
        assert_eq!(config.details.max_attempts, 5);
        assert_eq!(config.details.failed_path.as_deref(), Some("./failed.csv"));
        assert_eq!(config.selectors.product.name, "h1.title");
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let file = create_temp_config("[discovery]\nlast-page = 3\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.discovery.last_page, 3);
        assert_eq!(config.discovery.retry_pool_size, 5);
        assert_eq!(config.details.max_attempts, 20);
        assert_eq!(config.details.retry_max_attempts, 2);
        assert_eq!(config.http.request_timeout_ms, 10_000);
        assert!(config.identity.user_agents.len() >= 3);
    }

    #[test]
    fn test_empty_file_is_baseline() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.pacing.attempt_delay_min_ms, 1_000);
        assert_eq!(config.pacing.attempt_delay_max_ms, 5_000);
        assert_eq!(config.discovery.pool_size, 10);
        assert_eq!(config.discovery.last_page, 31);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[details]\npool-size = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
