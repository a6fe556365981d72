//! Output module for scan summaries and reports
//!
//! This module handles:
//! - Counting scan results by kind and by lesson
//! - Printing statistics to the terminal
//! - Writing markdown scan reports

mod markdown;
pub mod stats;

pub use markdown::{format_scan_report, generate_scan_report, ReportContext};
pub use stats::{compute_statistics, group_by_unit, print_statistics, ScanStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
