use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API section exists (enforced by serde) and its URL parses
/// - Server port is not 0
/// - Page size is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if let Err(e) = reqwest::Url::parse(&config.api.url) {
        return Err(ConfigError::ValidationError(format!(
            "api.url is not a valid URL: {}",
            e
        )));
    }

    if config.list.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "list.page_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, CacheConfig, ListConfig, ServerConfig};

    fn config() -> Config {
        Config {
            api: ApiConfig {
                url: "http://localhost:3000".to_string(),
                timeout_secs: 30,
                user_agent: "test".to_string(),
            },
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            list: ListConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bad_url_fails() {
        let mut config = config();
        config.api.url = "not a url".to_string();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_page_size_fails() {
        let mut config = config();
        config.list.page_size = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
