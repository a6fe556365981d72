//! Retrieval module for downloading discovered resources
//!
//! # Components
//!
//! - `RetrievalQueue`: K worker loops with pause, resume, stop and reset
//! - `ResourceSaver`: the save collaborator, with a filesystem implementation

mod queue;
mod saver;

pub use queue::{QueueStatus, RetrievalQueue, RunState};
pub use saver::{FileSaver, ResourceSaver};

// Progress types are shared with the crawl engine
pub use crate::progress::{RetrievalProgress, RetrievalSummary};
