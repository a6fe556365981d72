//! Lesson-Harvest: a course material harvester
//!
//! This crate walks the lesson pages of an online course, extracts the downloadable
//! resources each page links to, and retrieves a selected subset of them through a
//! bounded-concurrency queue that can be paused, resumed and stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod progress;
pub mod resource;
pub mod retrieval;

use thiserror::Error;

/// Main error type for Lesson-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to retrieve {url}: {reason}")]
    Retrieval { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Lesson-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, HttpPageFetcher, PageFetcher};
pub use progress::{ProgressReporter, TracingReporter};
pub use resource::{filter_by_kinds, ResourceDescriptor, ResourceKind, RetrievalState};
pub use retrieval::{
    FileSaver, QueueStatus, ResourceSaver, RetrievalProgress, RetrievalQueue, RetrievalSummary,
    RunState,
};
