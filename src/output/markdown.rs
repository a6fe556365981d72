//! Markdown scan report generation
//!
//! This module writes a human-readable report of a scan: run metadata, counts per
//! kind and the full resource list grouped by lesson.

use crate::output::stats::{compute_statistics, group_by_unit};
use crate::output::OutputResult;
use crate::resource::{ResourceDescriptor, ResourceKind};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Metadata printed at the top of a report
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// The scanned course
    pub course_id: String,

    /// When the scan finished
    pub generated_at: DateTime<Utc>,

    /// Hash of the configuration used for the scan
    pub config_hash: Option<String>,
}

impl ReportContext {
    /// Creates a context stamped with the current time
    pub fn now(course_id: impl Into<String>, config_hash: Option<String>) -> Self {
        Self {
            course_id: course_id.into(),
            generated_at: Utc::now(),
            config_hash,
        }
    }
}

/// Writes a markdown report for a scan
///
/// # Arguments
///
/// * `context` - Report metadata
/// * `resources` - The scan result
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn generate_scan_report(
    context: &ReportContext,
    resources: &[ResourceDescriptor],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_scan_report(context, resources);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a scan as markdown
pub fn format_scan_report(context: &ReportContext, resources: &[ResourceDescriptor]) -> String {
    let stats = compute_statistics(resources);
    let mut md = String::new();

    md.push_str("# Lesson-Harvest Scan Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Course**: {}\n", context.course_id));
    md.push_str(&format!(
        "- **Generated**: {}\n",
        context.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(hash) = &context.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push_str(&format!("- **Total Resources**: {}\n", stats.total));
    md.push_str(&format!(
        "- **Lessons With Resources**: {}\n\n",
        stats.units_with_resources()
    ));

    md.push_str("## Resources by Kind\n\n");
    md.push_str("| Kind | Count |\n");
    md.push_str("|------|-------|\n");
    for kind in ResourceKind::all() {
        md.push_str(&format!("| {} | {} |\n", kind.display_title(), stats.count_of(kind)));
    }
    md.push('\n');

    if resources.is_empty() {
        md.push_str("_No resources were found._\n");
        return md;
    }

    md.push_str("## Resources by Lesson\n\n");
    for (unit, unit_resources) in group_by_unit(resources) {
        md.push_str(&format!("### Unit {:02}\n\n", unit));
        for resource in unit_resources {
            md.push_str(&format!(
                "- `{}` ({}): {}\n",
                resource.file_name(),
                resource.state,
                resource.source_url
            ));
        }
        md.push('\n');
    }

    md
}
