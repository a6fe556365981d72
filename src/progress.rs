//! Progress reporting shared by the crawl engine and the retrieval queue
//!
//! Both engines push events into a [`ProgressReporter`]; every method has a no-op
//! default so a reporter only implements what it displays.

use crate::resource::ResourceDescriptor;
use crate::HarvestError;

/// Snapshot emitted after each retrieval attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalProgress {
    /// Resources saved so far
    pub completed: usize,

    /// Resources whose save failed so far
    pub failed: usize,

    /// Resources not yet claimed by a worker
    pub remaining: usize,

    /// Retrievals currently in flight
    pub active: usize,
}

/// Final counts of a retrieval run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetrievalSummary {
    /// Number of resources accepted by `start`
    pub total: usize,

    /// Resources saved
    pub completed: usize,

    /// Resources that failed
    pub failed: usize,
}

impl RetrievalSummary {
    /// Resources accepted but never attempted (only non-zero after a stop)
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.completed + self.failed)
    }
}

/// Callback interface consumed by both engines
pub trait ProgressReporter: Send + Sync {
    /// A lesson page was fetched and parsed
    ///
    /// `units_visited` counts lesson pages parsed so far; `initial_links` is the
    /// number of lesson links found on the course listing.
    fn on_scan_progress(&self, units_visited: usize, initial_links: usize) {
        let _ = (units_visited, initial_links);
    }

    /// A worker finished one retrieval attempt
    fn on_progress(&self, progress: RetrievalProgress) {
        let _ = progress;
    }

    /// A descriptor reached its final state; `error` is set when the save failed
    fn on_item_complete(&self, item: &ResourceDescriptor, error: Option<&HarvestError>) {
        let _ = (item, error);
    }

    /// Every worker has exited
    fn on_complete(&self, summary: RetrievalSummary) {
        let _ = summary;
    }
}

/// Reporter that writes every event to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn on_scan_progress(&self, units_visited: usize, initial_links: usize) {
        tracing::info!("Processing lesson {}/{}", units_visited, initial_links);
    }

    fn on_progress(&self, progress: RetrievalProgress) {
        tracing::info!(
            "Retrieved {} ({} failed), {} remaining, {} active",
            progress.completed,
            progress.failed,
            progress.remaining,
            progress.active
        );
    }

    fn on_item_complete(&self, item: &ResourceDescriptor, error: Option<&HarvestError>) {
        match error {
            None => tracing::info!("Saved {}", item.file_name()),
            Some(e) => tracing::warn!("Failed to save {}: {}", item.file_name(), e),
        }
    }

    fn on_complete(&self, summary: RetrievalSummary) {
        if summary.failed > 0 {
            tracing::warn!(
                "Retrieval finished: {} saved, {} failed, {} skipped",
                summary.completed,
                summary.failed,
                summary.skipped()
            );
        } else {
            tracing::info!(
                "Retrieval finished: {} saved, {} skipped",
                summary.completed,
                summary.skipped()
            );
        }
    }
}
