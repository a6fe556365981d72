//! Page fetching
//!
//! This module defines the page-fetch collaborator used by the crawl engine and its
//! HTTP implementation, including:
//! - Building HTTP clients with the configured user agent and session cookie
//! - GET requests that return the page markup
//! - Fixed-delay retries around each fetch

use crate::config::{Config, SessionConfig, UserAgentConfig};
use crate::crawler::retry::{retry_with_delay, RetryPolicy};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::Client;
use std::time::Duration;

/// Collaborator that turns an absolute URL into page markup
///
/// Implementations own any session or credential context the site needs, as well
/// as timeouts and retries.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the markup at `url`
    async fn fetch(&self, url: &str) -> Result<String, HarvestError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `session` - Optional session context passed through as a `Cookie` header
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - The cookie isn't a valid header value, or the client failed to build
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    session: Option<&SessionConfig>,
) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    if let Some(session) = session {
        let mut cookie = HeaderValue::from_str(&session.cookie).map_err(|e| HarvestError::Fetch {
            url: String::new(),
            reason: format!("invalid session cookie: {}", e),
        })?;
        cookie.set_sensitive(true);
        headers.insert(COOKIE, cookie);
    }

    let client = Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches pages over HTTP with retries
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpPageFetcher {
    /// Creates a fetcher from an existing client
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Creates a fetcher from the full configuration
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.user_agent, config.session.as_ref())?;
        Ok(Self::new(client, RetryPolicy::from(&config.retry)))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, HarvestError> {
        tracing::debug!("Fetching: {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/html")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, HarvestError> {
        retry_with_delay(self.retry, url, || self.fetch_once(url)).await
    }
}
