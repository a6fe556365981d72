//! Crawler module for lesson discovery
//!
//! This module contains the discovery side of the harvester, including:
//! - The page-fetch collaborator and its HTTP implementation with retries
//! - Lesson page parsing (resources and lesson links)
//! - The breadth-first crawl engine

mod engine;
mod fetcher;
mod parser;
mod retry;

pub use engine::{is_valid_course_id, CrawlEngine};
pub use fetcher::{build_http_client, HttpPageFetcher, PageFetcher};
pub use parser::{
    classify_document, classify_media, extract_lesson_links, extract_video_id, is_lesson_link,
    parse_lesson_page, MediaClass, ParsedLesson,
};
pub use retry::{retry_with_delay, RetryPolicy};

use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::resource::ResourceDescriptor;
use crate::HarvestError;

/// Scans a course over HTTP using the full configuration
///
/// This is the main entry point for discovery. It builds the HTTP fetcher from
/// the configuration and runs a single scan.
///
/// # Returns
///
/// * `Ok(Vec<ResourceDescriptor>)` - Resources found (empty if the listing couldn't be loaded)
/// * `Err(HarvestError)` - The HTTP client couldn't be built
///
/// # Example
///
/// ```no_run
/// use lesson_harvest::config::load_config;
/// use lesson_harvest::crawler::scan;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let resources = scan(&config, "12345", None).await?;
/// println!("{} resources", resources.len());
/// # Ok(())
/// # }
/// ```
pub async fn scan(
    config: &Config,
    course_id: &str,
    progress: Option<&dyn ProgressReporter>,
) -> Result<Vec<ResourceDescriptor>, HarvestError> {
    let fetcher = HttpPageFetcher::from_config(config)?;
    let engine = CrawlEngine::new(fetcher, config.crawler.clone());
    Ok(engine.scan_course(course_id, progress).await)
}
