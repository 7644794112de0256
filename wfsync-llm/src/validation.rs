//! Semantic validation of analysis payloads
//!
//! A gate, not a repair: a payload either passes untouched or is rejected
//! with the first failing check.

use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use wfsync_core::models::analysis::{
    ADDITIONS_KEY, DELETIONS_KEY, MODIFICATIONS_KEY, REQUIRED_SECTIONS,
};
use wfsync_core::models::story::{MIN_SEGMENTS, SEGMENT_SEPARATOR, STORY_EXTENSION};
use wfsync_core::StoryRecord;

/// Why a payload was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("missing required key '{0}' in LLM response")]
    MissingSection(String),

    #[error("'{0}' is not a list")]
    NotAList(String),

    #[error("stories_to_delete references non-existent file: {0}")]
    UnknownDeletion(String),

    #[error("stories_to_modify references non-existent file: {0}")]
    UnknownModification(String),

    #[error("stories_to_add missing filename")]
    MissingFilename,

    #[error("filename doesn't end with .md: {0}")]
    WrongExtension(String),

    #[error("filename doesn't follow {{wave}}-{{epic}}-{{story}}-{{slug}}.md: {0}")]
    TooFewSegments(String),

    #[error("duplicate filename proposed: {0}")]
    Duplicate(String),
}

fn section<'a>(payload: &'a Value, key: &str) -> &'a [Value] {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// File name component of a story reference
fn referenced_filename(item: &Value) -> String {
    Path::new(str_field(item, "file_path"))
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Check a parsed payload against the stories of the scenario
pub fn validate_payload(payload: &Value, stories: &[StoryRecord]) -> Result<(), ValidationFailure> {
    for key in REQUIRED_SECTIONS {
        match payload.get(key) {
            None => return Err(ValidationFailure::MissingSection(key.to_string())),
            Some(value) if !value.is_array() => {
                return Err(ValidationFailure::NotAList(key.to_string()))
            }
            Some(_) => {}
        }
    }

    let existing: HashSet<&str> = stories.iter().map(|s| s.filename.as_str()).collect();

    for item in section(payload, DELETIONS_KEY) {
        let filename = referenced_filename(item);
        if !existing.contains(filename.as_str()) {
            return Err(ValidationFailure::UnknownDeletion(filename));
        }
    }

    for item in section(payload, MODIFICATIONS_KEY) {
        let filename = referenced_filename(item);
        if !existing.contains(filename.as_str()) {
            return Err(ValidationFailure::UnknownModification(filename));
        }
    }

    let mut proposed = HashSet::new();
    for item in section(payload, ADDITIONS_KEY) {
        let filename = str_field(item, "filename");
        if filename.is_empty() {
            return Err(ValidationFailure::MissingFilename);
        }
        let Some(stem) = filename.strip_suffix(STORY_EXTENSION) else {
            return Err(ValidationFailure::WrongExtension(filename.to_string()));
        };
        if stem.split(SEGMENT_SEPARATOR).count() < MIN_SEGMENTS {
            return Err(ValidationFailure::TooFewSegments(filename.to_string()));
        }
        if !proposed.insert(filename) {
            return Err(ValidationFailure::Duplicate(filename.to_string()));
        }
    }

    let deletions = section(payload, DELETIONS_KEY).len();
    if deletions * 2 > existing.len() {
        tracing::warn!(
            "Suspicious: proposing to delete {deletions} of {} stories (>50%)",
            existing.len()
        );
    }
    if REQUIRED_SECTIONS.iter().all(|key| section(payload, key).is_empty()) {
        tracing::warn!("No changes detected in LLM response");
    }

    tracing::debug!("LLM response validation passed");
    Ok(())
}
