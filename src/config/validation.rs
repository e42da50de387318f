use crate::config::types::{
    Config, InputConfig, OutputConfig, ProxyConfig, RetryConfig, ScraperConfig,
};
use crate::domain::Region;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_retry_config(&config.retry)?;
    validate_user_agent(&config.http.user_agent)?;
    validate_proxy_config(&config.proxies)?;
    validate_output_config(&config.output)?;
    validate_input_config(&config.input)?;
    Ok(())
}

/// Validates pipeline limits
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_items < 1 {
        return Err(ConfigError::Validation(
            "max_items must be >= 1".to_string(),
        ));
    }

    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.max_pages_per_input < 1 {
        return Err(ConfigError::Validation(
            "max_pages_per_input must be >= 1".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.max_fatal_errors < 1 {
        return Err(ConfigError::Validation(
            "max_fatal_errors must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.max_delay_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms ({}) must be >= base_delay_ms ({})",
            config.max_delay_ms, config.base_delay_ms
        )));
    }

    Ok(())
}

fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates proxy endpoints (http, https or socks5 URLs with a host)
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    for endpoint in &config.pool {
        let url = Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https" | "socks5" | "socks5h") {
            return Err(ConfigError::Validation(format!(
                "Proxy '{}' must use http, https or socks5",
                endpoint
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Proxy '{}' has no host",
                endpoint
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.basename.trim().is_empty() || config.basename.contains(&['/', '\\'][..]) {
        return Err(ConfigError::Validation(format!(
            "output basename must be a plain file name, got '{}'",
            config.basename
        )));
    }

    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one output format is required".to_string(),
        ));
    }

    Ok(())
}

/// Validates the configured inputs
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.is_empty() {
        return Err(ConfigError::Validation(
            "provide at least one url, keyword or listing url".to_string(),
        ));
    }

    if config.regions.is_empty() {
        return Err(ConfigError::Validation(
            "at least one region is required".to_string(),
        ));
    }

    for region in &config.regions {
        region.parse::<Region>()?;
    }

    for url in config.urls.iter().chain(&config.listing_urls) {
        validate_http_url(url)?;
    }

    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "keywords cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid input URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Input URL '{}' must use http or https",
            raw
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{HttpConfig, OutputFormat};

    fn valid_config() -> Config {
        Config {
            scraper: ScraperConfig::default(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
            proxies: ProxyConfig::default(),
            output: OutputConfig::default(),
            input: InputConfig {
                keywords: vec!["lamp".to_string()],
                ..InputConfig::default()
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_requires_an_input() {
        let mut config = valid_config();
        config.input.keywords.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_unknown_region() {
        let mut config = valid_config();
        config.input.regions = vec!["US".to_string(), "XX".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::UnknownRegion(code)) if code == "XX"
        ));
    }

    #[test]
    fn test_rejects_bad_input_url() {
        let mut config = valid_config();
        config.input.urls = vec!["ftp://www.ebay.com/sch".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_bad_proxy() {
        let mut config = valid_config();
        config.proxies.pool = vec!["not a proxy".to_string()];
        assert!(validate(&config).is_err());

        config.proxies.pool = vec!["ftp://proxy:21".to_string()];
        assert!(validate(&config).is_err());

        config.proxies.pool = vec!["socks5://proxy:1080".to_string()];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_retry_bounds() {
        let mut config = valid_config();
        config.retry.max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.retry.base_delay_ms = 10_000;
        config.retry.max_delay_ms = 1_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_output_requires_format() {
        let mut config = valid_config();
        config.output.formats.clear();
        assert!(validate(&config).is_err());

        config.output.formats = vec![OutputFormat::Csv];
        config.output.basename = "../escape".to_string();
        assert!(validate(&config).is_err());
    }
}
