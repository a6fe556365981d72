//! Statistics over scan results
//!
//! This module counts discovered resources by kind and by lesson and prints them.

use crate::resource::{ResourceDescriptor, ResourceKind};
use std::collections::BTreeMap;

/// Scan statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStatistics {
    /// Total number of resources discovered
    pub total: usize,

    /// Count of resources by kind
    pub by_kind: BTreeMap<ResourceKind, usize>,

    /// Count of resources by lesson ordinal
    pub by_unit: BTreeMap<u32, usize>,
}

impl ScanStatistics {
    /// Counts resources of one kind
    pub fn count_of(&self, kind: ResourceKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Number of lessons that contributed at least one resource
    pub fn units_with_resources(&self) -> usize {
        self.by_unit.len()
    }
}

/// Computes statistics for a list of resources
pub fn compute_statistics(resources: &[ResourceDescriptor]) -> ScanStatistics {
    let mut stats = ScanStatistics {
        total: resources.len(),
        ..ScanStatistics::default()
    };

    for resource in resources {
        *stats.by_kind.entry(resource.kind).or_insert(0) += 1;
        *stats.by_unit.entry(resource.unit_index).or_insert(0) += 1;
    }

    stats
}

/// Groups resources by lesson ordinal, preserving their order within each lesson
pub fn group_by_unit(resources: &[ResourceDescriptor]) -> BTreeMap<u32, Vec<&ResourceDescriptor>> {
    let mut grouped: BTreeMap<u32, Vec<&ResourceDescriptor>> = BTreeMap::new();
    for resource in resources {
        grouped.entry(resource.unit_index).or_default().push(resource);
    }
    grouped
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ScanStatistics) {
    println!("=== Scan Statistics ===\n");

    println!("Overview:");
    println!("  Total resources: {}", stats.total);
    println!("  Lessons with resources: {}", stats.units_with_resources());
    println!();

    println!("Resources by Kind:");
    for kind in ResourceKind::all() {
        let count = stats.count_of(kind);
        let percentage = if stats.total > 0 {
            (count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", kind, count, percentage);
    }
    println!();

    println!("Resources by Lesson:");
    for (unit, count) in &stats.by_unit {
        println!("  Unit {:02}: {}", unit, count);
    }
}
