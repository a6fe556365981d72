use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Lesson-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub session: Option<SessionConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Site root every lesson identifier is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of a course's lesson listing; `{course_id}` is substituted
    #[serde(rename = "listing-path", default = "default_listing_path")]
    pub listing_path: String,

    /// Pause after each successfully fetched lesson page (milliseconds)
    #[serde(rename = "fetch-delay-ms", default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
}

impl CrawlerConfig {
    /// Creates a crawler configuration with default listing path and delay
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            listing_path: default_listing_path(),
            fetch_delay_ms: default_fetch_delay_ms(),
        }
    }

    /// Returns the inter-fetch delay as a `Duration`
    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    /// Builds the listing path for a course
    pub fn listing_path_for(&self, course_id: &str) -> String {
        self.listing_path.replace("{course_id}", course_id)
    }
}

/// Retrieval queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Number of concurrent retrieval workers
    #[serde(rename = "max-concurrent", default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Pause a worker takes after each retrieval while work remains (milliseconds)
    #[serde(rename = "download-delay-ms", default = "default_download_delay_ms")]
    pub download_delay_ms: u64,

    /// Directory the filesystem saver writes into
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl RetrievalConfig {
    /// Returns the inter-download delay as a `Duration`
    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            download_delay_ms: default_download_delay_ms(),
            output_dir: default_output_dir(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the client
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the client
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
        }
    }
}

/// Retry behavior of the HTTP page fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per page fetch, including the first one
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,

    /// Wait between attempts (milliseconds)
    #[serde(rename = "delay-ms", default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl RetryConfig {
    /// Returns the wait between attempts as a `Duration`
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Session context supplied by the host environment
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Raw `Cookie` header value sent with every request
    pub cookie: String,
}

fn default_listing_path() -> String {
    "/app/dashboard/courses/{course_id}/lessons".to_string()
}

fn default_fetch_delay_ms() -> u64 {
    300
}

fn default_max_concurrent() -> usize {
    3
}

fn default_download_delay_ms() -> u64 {
    500
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_crawler_name() -> String {
    "LessonHarvest".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}
