//! HTML parser for lesson pages
//!
//! This module extracts two things from a lesson page's markup:
//! - Downloadable resources (books, per-video summaries, slides and mind maps)
//! - Links to further lesson pages
//!
//! Parsing never fails. Markup that doesn't have the expected shape simply yields
//! fewer (or zero) resources and links.

use crate::resource::{ResourceDescriptor, ResourceKind};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Anchors pointing at the lesson's e-book endpoints
const DOCUMENT_LINKS: &str = r#"a[href*="api/aluno/pdf"]"#;

/// Anchors pointing at per-video endpoints
const MEDIA_LINKS: &str = r#"a[href*="api/video"]"#;

/// Anchors that may point at another lesson page
const LESSON_LINKS: &str = r#"a[href*="/lessons/"]"#;

/// Extracted information from a lesson page
#[derive(Debug, Clone, Default)]
pub struct ParsedLesson {
    /// Resources in document order, with unresolved source URLs
    pub resources: Vec<ResourceDescriptor>,

    /// Lesson page identifiers (hrefs), de-duplicated, in document order
    pub lesson_links: Vec<String>,
}

/// Classification of a media anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    /// A per-video resource that becomes a descriptor
    Resource(ResourceKind),

    /// The video stream itself; recognized and dropped
    RawVideo,
}

/// Parses a lesson page into resources and outbound lesson links
///
/// # Video Ordinals
///
/// Per-video resources carry a video ordinal that starts at 1 for each page. A
/// resource takes the current ordinal; the ordinal then advances only when a
/// summary is seen for a video id for the first time. A video without a summary
/// therefore never advances it, and its slides or mind map share the ordinal of
/// whatever comes next.
///
/// # Arguments
///
/// * `html` - The page markup
/// * `unit_index` - The lesson ordinal assigned by the crawl
///
/// # Example
///
/// ```
/// use lesson_harvest::crawler::parse_lesson_page;
///
/// let html = r#"<a href="/api/aluno/pdf/download/1">Book</a>"#;
/// let parsed = parse_lesson_page(html, 1);
/// assert_eq!(parsed.resources.len(), 1);
/// assert_eq!(parsed.resources[0].file_name(), "Unit01_LivroEletronico_Original.pdf");
/// ```
pub fn parse_lesson_page(html: &str, unit_index: u32) -> ParsedLesson {
    let document = Html::parse_document(html);

    let mut resources = extract_books(&document, unit_index);
    resources.extend(extract_video_resources(&document, unit_index));

    ParsedLesson {
        resources,
        lesson_links: collect_lesson_links(&document),
    }
}

/// Extracts only the lesson links from a page (used for the course listing)
pub fn extract_lesson_links(html: &str) -> Vec<String> {
    collect_lesson_links(&Html::parse_document(html))
}

/// Classifies an e-book href
///
/// Returns None for document endpoints that aren't downloads.
pub fn classify_document(href: &str) -> Option<ResourceKind> {
    if href.contains("pdfGrifado") {
        Some(ResourceKind::HighlightedBook)
    } else if href.contains("pdf/download") {
        Some(ResourceKind::OriginalBook)
    } else {
        None
    }
}

/// Classifies a media download href; first marker wins
pub fn classify_media(href: &str) -> MediaClass {
    if href.contains("resumo") {
        MediaClass::Resource(ResourceKind::Summary)
    } else if href.contains("slideshow") {
        MediaClass::Resource(ResourceKind::SlideDeck)
    } else if href.contains("mapa_mental") {
        MediaClass::Resource(ResourceKind::MindMap)
    } else {
        MediaClass::RawVideo
    }
}

/// Extracts the numeric video id from a `/video/<digits>/` path segment
pub fn extract_video_id(href: &str) -> Option<&str> {
    href.match_indices("/video/").find_map(|(start, marker)| {
        let rest = &href[start + marker.len()..];
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .map(|end| &rest[..end])?;

        // The id must be followed by a further path segment
        if !digits.is_empty() && rest[digits.len()..].starts_with('/') {
            Some(digits)
        } else {
            None
        }
    })
}

/// Returns true if the href is a lesson page: `.../lessons/<digits>` with nothing after
pub fn is_lesson_link(href: &str) -> bool {
    if href.contains("videos") {
        return false;
    }

    match href.rsplit_once("/lessons/") {
        Some((_, id)) => !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn extract_books(document: &Html, unit_index: u32) -> Vec<ResourceDescriptor> {
    select_hrefs(document, DOCUMENT_LINKS)
        .filter_map(|href| {
            classify_document(href)
                .map(|kind| ResourceDescriptor::lesson(kind, href, unit_index))
        })
        .collect()
}

fn extract_video_resources(document: &Html, unit_index: u32) -> Vec<ResourceDescriptor> {
    let mut resources = Vec::new();
    let mut summarized_videos: HashSet<Option<&str>> = HashSet::new();
    let mut video_ordinal = 1;

    for href in select_hrefs(document, MEDIA_LINKS) {
        if !href.contains("/download/") {
            continue;
        }

        let class = classify_media(href);
        if let MediaClass::Resource(kind) = class {
            resources.push(ResourceDescriptor::video(
                kind,
                href,
                unit_index,
                video_ordinal,
            ));
        }

        if class == MediaClass::Resource(ResourceKind::Summary)
            && summarized_videos.insert(extract_video_id(href))
        {
            video_ordinal += 1;
        }
    }

    resources
}

fn collect_lesson_links(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();

    select_hrefs(document, LESSON_LINKS)
        .filter(|href| is_lesson_link(href))
        .filter(|href| seen.insert(*href))
        .map(str::to_string)
        .collect()
}

/// Yields the href of every element matching `selector`, in document order
fn select_hrefs<'a>(document: &'a Html, selector: &str) -> impl Iterator<Item = &'a str> + 'a {
    let selector = Selector::parse(selector).ok();

    selector
        .into_iter()
        .flat_map(move |selector| document.select(&selector).collect::<Vec<ElementRef<'a>>>())
        .filter_map(|element| element.value().attr("href"))
}
