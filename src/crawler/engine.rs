//! Crawl engine - breadth-first discovery of a course's lesson pages
//!
//! This module contains the scan loop that:
//! - Fetches the course's lesson listing
//! - Walks the lesson graph through a FIFO frontier and a visited set
//! - Parses each lesson page for resources and further lesson links
//! - Reports progress and paces requests

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{extract_lesson_links, parse_lesson_page};
use crate::progress::ProgressReporter;
use crate::resource::ResourceDescriptor;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Traversal state owned by a single scan
#[derive(Debug, Default)]
struct CrawlState {
    /// Lesson identifiers already dequeued
    visited: HashSet<String>,

    /// Lesson identifiers waiting for a visit, in discovery order
    frontier: VecDeque<String>,

    /// Resources accumulated so far, in visit order
    results: Vec<ResourceDescriptor>,
}

impl CrawlState {
    fn seeded(links: Vec<String>) -> Self {
        Self {
            frontier: links.into(),
            ..Self::default()
        }
    }

    /// Pops the next identifier that hasn't been visited yet and marks it visited
    fn next_unvisited(&mut self) -> Option<String> {
        while let Some(id) = self.frontier.pop_front() {
            if self.visited.insert(id.clone()) {
                return Some(id);
            }
            tracing::trace!("Skipping already visited lesson {}", id);
        }
        None
    }

    /// Appends links that are neither visited nor already queued
    fn enqueue_new(&mut self, links: Vec<String>) {
        for link in links {
            if !self.visited.contains(&link) && !self.frontier.contains(&link) {
                self.frontier.push_back(link);
            }
        }
    }
}

/// Discovers every lesson reachable from a course listing and collects its resources
pub struct CrawlEngine<F> {
    fetcher: F,
    config: CrawlerConfig,
}

impl<F: PageFetcher> CrawlEngine<F> {
    /// Creates a new engine
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The page-fetch collaborator
    /// * `config` - Base URL, listing path and inter-fetch delay
    pub fn new(fetcher: F, config: CrawlerConfig) -> Self {
        Self { fetcher, config }
    }

    /// Returns the crawler configuration
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Scans a course and returns every resource found on its lesson pages
    ///
    /// # Unit Numbering
    ///
    /// Lessons are numbered 1, 2, 3... in the order they are dequeued from the
    /// frontier, not in the order their links first appear. For a listing that
    /// links every lesson this is listing order; lessons discovered only from other
    /// lesson pages are numbered after everything queued before them.
    ///
    /// # Failures
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Listing fetch fails | Log, return an empty list |
    /// | Lesson fetch fails | Log, skip the lesson (its unit number is still consumed) |
    /// | Markup has an unexpected shape | Lesson contributes fewer or no resources |
    ///
    /// # Arguments
    ///
    /// * `course_id` - The course identifier substituted into the listing path
    /// * `progress` - Optional reporter receiving `(units visited, initial link count)`
    pub async fn scan_course(
        &self,
        course_id: &str,
        progress: Option<&dyn ProgressReporter>,
    ) -> Vec<ResourceDescriptor> {
        tracing::info!("Starting scan for course {}", course_id);

        let base_url = match Url::parse(&self.config.base_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Invalid base URL {}: {}", self.config.base_url, e);
                return Vec::new();
            }
        };

        let listing_url = resolve_link(&self.config.listing_path_for(course_id), &base_url);
        let listing_html = match self.fetcher.fetch(&listing_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to load course listing {}: {}", listing_url, e);
                return Vec::new();
            }
        };

        let initial_links = extract_lesson_links(&listing_html);
        let initial_count = initial_links.len();
        tracing::info!("Found {} lessons in listing", initial_count);

        let mut state = CrawlState::seeded(initial_links);
        let mut unit_index: u32 = 0;

        while let Some(lesson_id) = state.next_unvisited() {
            unit_index += 1;

            let lesson_url = resolve_link(&lesson_id, &base_url);
            let html = match self.fetcher.fetch(&lesson_url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Skipping lesson {} ({}): {}", unit_index, lesson_url, e);
                    continue;
                }
            };

            let parsed = parse_lesson_page(&html, unit_index);
            tracing::info!("Lesson {}: {} items", unit_index, parsed.resources.len());

            state
                .results
                .extend(parsed.resources.into_iter().map(|mut resource| {
                    resource.source_url = resolve_link(&resource.source_url, &base_url);
                    resource
                }));
            state.enqueue_new(parsed.lesson_links);

            if let Some(reporter) = progress {
                reporter.on_scan_progress(state.visited.len(), initial_count);
            }

            let delay = self.config.fetch_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::info!(
            "Scan complete: {} items found across {} lessons",
            state.results.len(),
            state.visited.len()
        );

        state.results
    }
}

/// Returns true if `course_id` looks like a course identifier (digits only)
pub fn is_valid_course_id(course_id: &str) -> bool {
    let trimmed = course_id.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Resolves an href against the base URL
///
/// Falls back to the href itself when it can't be joined.
fn resolve_link(href: &str, base_url: &Url) -> String {
    match base_url.join(href.trim()) {
        Ok(absolute_url) => absolute_url.to_string(),
        Err(_) => href.to_string(),
    }
}
