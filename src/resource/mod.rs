//! Resource module describing what a lesson page offers for download
//!
//! # Components
//!
//! - `ResourceKind`: the closed set of downloadable kinds and their lookup tables
//! - `RetrievalState`: pending, downloaded or failed
//! - `ResourceDescriptor`: one discovered resource and its derived filename

mod descriptor;
mod kind;

// Re-export main types
pub use descriptor::{derive_file_name, ResourceDescriptor};
pub use kind::{ResourceKind, RetrievalState};

/// Keeps only the descriptors whose kind is in `kinds`, preserving order
///
/// The input is left untouched; the returned descriptors are copies.
pub fn filter_by_kinds(
    descriptors: &[ResourceDescriptor],
    kinds: &[ResourceKind],
) -> Vec<ResourceDescriptor> {
    descriptors
        .iter()
        .filter(|d| kinds.contains(&d.kind))
        .cloned()
        .collect()
}
