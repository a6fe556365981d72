use crate::resource::{ResourceKind, RetrievalState};

/// A downloadable resource discovered on a lesson page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// What the resource is
    pub kind: ResourceKind,

    /// Where to retrieve it from (absolute once the crawl has resolved it)
    pub source_url: String,

    /// Human-readable title
    pub display_title: String,

    /// Lesson ordinal, starting at 1
    pub unit_index: u32,

    /// Video ordinal within the lesson, only set for per-video kinds
    pub sub_index: Option<u32>,

    /// Retrieval progress of this resource
    pub state: RetrievalState,
}

impl ResourceDescriptor {
    /// Creates a pending descriptor for a lesson-wide resource (books)
    pub fn lesson(kind: ResourceKind, source_url: impl Into<String>, unit_index: u32) -> Self {
        Self {
            kind,
            source_url: source_url.into(),
            display_title: kind.display_title().to_string(),
            unit_index,
            sub_index: None,
            state: RetrievalState::Pending,
        }
    }

    /// Creates a pending descriptor for a resource attached to one video of a lesson
    pub fn video(
        kind: ResourceKind,
        source_url: impl Into<String>,
        unit_index: u32,
        video_index: u32,
    ) -> Self {
        Self {
            sub_index: Some(video_index),
            ..Self::lesson(kind, source_url, unit_index)
        }
    }

    /// Derives the filename this resource is saved under
    ///
    /// Format: `UnitNN_[VMM_]Suffix`, e.g. `Unit03_V02_Resumo.pdf`.
    pub fn file_name(&self) -> String {
        derive_file_name(self.kind, self.unit_index, self.sub_index)
    }
}

/// Derives a filename from a kind, a lesson ordinal and an optional video ordinal
pub fn derive_file_name(kind: ResourceKind, unit_index: u32, sub_index: Option<u32>) -> String {
    let video_prefix = sub_index
        .map(|sub| format!("V{:02}_", sub))
        .unwrap_or_default();

    format!("Unit{:02}_{}{}", unit_index, video_prefix, kind.file_suffix())
}
