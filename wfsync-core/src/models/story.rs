//! Story files and the `{wave}-{epic}-{story}-{slug}.md` naming convention

use serde::{Deserialize, Serialize};

/// Extension every story file carries
pub const STORY_EXTENSION: &str = ".md";

/// Separator between filename segments
pub const SEGMENT_SEPARATOR: char = '-';

/// Minimum number of segments in a well-formed story stem
pub const MIN_SEGMENTS: usize = 4;

/// One scanned story file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Path relative to the project root, `/`-separated
    pub file_path: String,
    /// File name, the story identity
    pub filename: String,
    pub wave: String,
    pub epic: String,
    pub story: String,
    pub slug: String,
    /// Parsed front matter
    pub frontmatter: serde_json::Value,
    /// Bounded body excerpt
    pub content_preview: String,
}

/// Wave/epic/story/slug segments of a story stem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryId {
    pub wave: String,
    pub epic: String,
    pub story: String,
    pub slug: String,
}

impl StoryId {
    /// Split a stem on `-`; absent segments become empty strings and every
    /// segment past the third is folded back into the slug.
    pub fn from_stem(stem: &str) -> Self {
        let parts: Vec<&str> = stem.split(SEGMENT_SEPARATOR).collect();
        let segment = |i: usize| parts.get(i).map_or_else(String::new, |s| (*s).to_string());
        Self {
            wave: segment(0),
            epic: segment(1),
            story: segment(2),
            slug: parts.get(3..).map_or_else(String::new, |rest| {
                rest.join(&SEGMENT_SEPARATOR.to_string())
            }),
        }
    }
}

/// Whether a proposed filename follows the story naming convention
pub fn follows_naming_convention(filename: &str) -> bool {
    filename
        .strip_suffix(STORY_EXTENSION)
        .is_some_and(|stem| stem.split(SEGMENT_SEPARATOR).count() >= MIN_SEGMENTS)
}
