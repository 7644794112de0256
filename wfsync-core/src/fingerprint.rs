//! Content fingerprints
//!
//! A fingerprint is the first 16 hex characters of a SHA-256 digest. It is a
//! cache key, not a security boundary, so the truncation is acceptable.
//! Combined fingerprints sort their inputs first: scanning the same files in
//! a different traversal order yields the same key.

use crate::models::{ScenarioName, StoryRecord, WorkflowCorpus};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex characters kept from the digest
pub const FINGERPRINT_LEN: usize = 16;

/// Truncated SHA-256 of raw bytes
pub fn digest(bytes: &[u8]) -> String {
    let mut encoded = hex::encode(Sha256::digest(bytes));
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

/// Fingerprint of a file's content
pub fn file_fingerprint(path: &Path) -> crate::Result<String> {
    Ok(digest(&std::fs::read(path)?))
}

/// Fingerprint of a serialized record
pub fn record_fingerprint<T: Serialize>(record: &T) -> crate::Result<String> {
    Ok(digest(&serde_json::to_vec(record)?))
}

/// Order-independent fingerprint of a scenario plus a set of fingerprints
pub fn combine<I, S>(scenario: &ScenarioName, parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parts: Vec<String> = parts.into_iter().map(|p| p.as_ref().to_string()).collect();
    parts.sort();
    digest(format!("{scenario}:{}", parts.concat()).as_bytes())
}

/// Cache key for one scenario: every workflow checksum plus one fingerprint
/// per story record, folded with the scenario name.
pub fn analysis_key(
    corpus: &WorkflowCorpus,
    scenario: &ScenarioName,
    stories: &[StoryRecord],
) -> crate::Result<String> {
    let mut parts: Vec<String> = corpus.checksums().into_iter().map(str::to_string).collect();
    for story in stories {
        parts.push(record_fingerprint(story)?);
    }
    Ok(combine(scenario, parts))
}
