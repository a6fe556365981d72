use crate::config::types::{
    Config, CrawlerConfig, RetrievalConfig, RetryConfig, SessionConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on retrieval workers
const MAX_CONCURRENT_LIMIT: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retrieval_config(&config.retrieval)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_retry_config(&config.retry)?;
    if let Some(session) = &config.session {
        validate_session_config(session)?;
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if !config.listing_path.contains("{course_id}") {
        return Err(ConfigError::Validation(format!(
            "listing_path must contain the {{course_id}} placeholder, got '{}'",
            config.listing_path
        )));
    }

    Ok(())
}

/// Validates retrieval configuration
fn validate_retrieval_config(config: &RetrievalConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > MAX_CONCURRENT_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and {}, got {}",
            MAX_CONCURRENT_LIMIT, config.max_concurrent
        )));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry attempts must be >= 1, got {}",
            config.attempts
        )));
    }
    Ok(())
}

/// Validates the pass-through session context
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.cookie.trim().is_empty() {
        return Err(ConfigError::Validation(
            "session cookie cannot be empty when [session] is present".to_string(),
        ));
    }

    // Header values cannot carry line breaks
    if config.cookie.contains(['\r', '\n']) {
        return Err(ConfigError::Validation(
            "session cookie cannot contain line breaks".to_string(),
        ));
    }

    Ok(())
}
