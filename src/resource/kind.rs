/// Resource kind definitions
///
/// This module defines the closed set of downloadable resource kinds a lesson page can
/// expose, along with the lookup tables derived from them.
use std::fmt;
use std::str::FromStr;

/// The kind of a downloadable lesson resource
///
/// Raw video and audio streams are recognized while parsing but are never turned into
/// a `ResourceKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    // ===== Book Resources (one per lesson) =====
    /// The lesson's e-book as published
    OriginalBook,

    /// The lesson's e-book with highlights
    HighlightedBook,

    // ===== Per-Video Resources =====
    /// Written summary of a video
    Summary,

    /// Slide deck shown in a video
    SlideDeck,

    /// Mind map of a video
    MindMap,
}

impl ResourceKind {
    /// Returns the fixed filename suffix for this kind
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Self::OriginalBook => "LivroEletronico_Original.pdf",
            Self::HighlightedBook => "LivroEletronico_Grifado.pdf",
            Self::Summary => "Resumo.pdf",
            Self::SlideDeck => "Slides.pdf",
            Self::MindMap => "MapaMental.pdf",
        }
    }

    /// Returns the stable name used on the command line and in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OriginalBook => "original-book",
            Self::HighlightedBook => "highlighted-book",
            Self::Summary => "summary",
            Self::SlideDeck => "slide-deck",
            Self::MindMap => "mind-map",
        }
    }

    /// Returns the human-readable title given to descriptors of this kind
    pub fn display_title(&self) -> &'static str {
        match self {
            Self::OriginalBook => "E-book (Original)",
            Self::HighlightedBook => "E-book (Highlighted)",
            Self::Summary => "Summary",
            Self::SlideDeck => "Slides",
            Self::MindMap => "Mind Map",
        }
    }

    /// Returns true if resources of this kind belong to a single video of a lesson
    pub fn is_per_video(&self) -> bool {
        matches!(self, Self::Summary | Self::SlideDeck | Self::MindMap)
    }

    /// Returns all resource kinds in declaration order
    pub fn all() -> [Self; 5] {
        [
            Self::OriginalBook,
            Self::HighlightedBook,
            Self::Summary,
            Self::SlideDeck,
            Self::MindMap,
        ]
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::all().iter().map(|k| k.as_str()).collect();
                format!(
                    "unknown resource kind '{}', expected one of: {}",
                    s,
                    known.join(", ")
                )
            })
    }
}

/// Retrieval state of a single descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RetrievalState {
    /// Not yet retrieved
    #[default]
    Pending,

    /// Saved successfully
    Downloaded,

    /// The save collaborator reported a failure
    Failed,
}

impl RetrievalState {
    /// Returns true once the descriptor has left the pending state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RetrievalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Downloaded => "downloaded",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}
