//! Workflow and story scanners
//!
//! Every file yields a [`ScanOutcome`]: a parsed record or a skip with the
//! reason. A bad file never aborts a scan; skips are logged as warnings.

pub mod frontmatter;

use crate::fingerprint;
use crate::models::story::{follows_naming_convention, StoryId, STORY_EXTENSION};
use crate::models::{StoryRecord, WorkflowCorpus, WorkflowKind, WorkflowRecord};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use wfsync_utils::{is_within_root, read_text_file, truncate_chars};

/// Characters of workflow body kept for prompts
pub const WORKFLOW_EXCERPT_CHARS: usize = 2000;
/// Characters of story body kept for prompts
pub const STORY_EXCERPT_CHARS: usize = 1000;
/// File names recognised as workflow definitions
pub const WORKFLOW_FILE_NAMES: [&str; 2] = ["workflow.md", "workflow.yaml"];

/// Result of scanning one file
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome<T> {
    Scanned(T),
    Skipped { path: PathBuf, reason: String },
}

impl<T> ScanOutcome<T> {
    fn skipped(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Skipped {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// The record, logging the reason when the file was skipped
    pub fn into_record(self) -> Option<T> {
        match self {
            Self::Scanned(record) => Some(record),
            Self::Skipped { path, reason } => {
                tracing::warn!("Skipping {}: {reason}", path.display());
                None
            }
        }
    }
}

/// Scan one workflow root into a corpus
pub fn scan_workflows(base_path: &Path, project_root: &Path) -> WorkflowCorpus {
    tracing::info!("Scanning workflows in {}", base_path.display());
    let mut corpus = WorkflowCorpus::new();

    let files: Vec<PathBuf> = WalkDir::new(base_path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Cannot read entry under {}: {e}", base_path.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| WORKFLOW_FILE_NAMES.contains(&name))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    tracing::debug!("Found {} workflow files", files.len());

    for path in files {
        if let Some(record) = scan_workflow_file(base_path, &path, project_root).into_record() {
            tracing::debug!("Scanned {}/{}: {}", record.category, record.name, record.checksum);
            corpus.insert(record);
        }
    }

    tracing::info!("Scanned {} workflow categories", corpus.category_count());
    corpus
}

/// Scan several roots; later roots replace earlier ones per category
pub fn scan_workflow_roots(roots: &[PathBuf], project_root: &Path) -> WorkflowCorpus {
    roots.iter().fold(WorkflowCorpus::new(), |mut corpus, root| {
        corpus.merge(scan_workflows(&project_root.join(root), project_root));
        corpus
    })
}

/// Parse a single workflow file
pub fn scan_workflow_file(
    base_path: &Path,
    path: &Path,
    project_root: &Path,
) -> ScanOutcome<WorkflowRecord> {
    if !is_within_root(path, project_root) {
        return ScanOutcome::skipped(path, "path outside project root");
    }

    let Ok(relative) = path.strip_prefix(base_path) else {
        return ScanOutcome::skipped(path, "not under the workflow root");
    };
    let components: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let category = if components.len() > 1 {
        components[0].clone()
    } else {
        "root".to_string()
    };
    let name = path
        .parent()
        .and_then(Path::file_name)
        .map_or_else(|| "root".to_string(), |n| n.to_string_lossy().to_string());

    let content = match read_text_file(path) {
        Ok(content) => content,
        Err(e) => return ScanOutcome::skipped(path, e),
    };

    let is_document = path.extension().and_then(|e| e.to_str()) == Some("md");
    let parsed = if is_document {
        frontmatter::parse(&content).map(|doc| {
            (
                WorkflowKind::Document,
                doc.metadata,
                Some(truncate_chars(&doc.body, WORKFLOW_EXCERPT_CHARS)),
            )
        })
    } else {
        frontmatter::parse_yaml_mapping(&content).map(|config| (WorkflowKind::Config, config, None))
    };
    let (kind, metadata, excerpt) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => return ScanOutcome::skipped(path, e),
    };

    let checksum = match fingerprint::file_fingerprint(path) {
        Ok(checksum) => checksum,
        Err(e) => return ScanOutcome::skipped(path, e),
    };

    ScanOutcome::Scanned(WorkflowRecord {
        category,
        name,
        kind,
        declared_name: frontmatter::string_field(&metadata, "name"),
        description: frontmatter::string_field(&metadata, "description"),
        metadata,
        excerpt,
        checksum,
        path: relative.to_string_lossy().to_string(),
    })
}

/// Scan the story files directly inside a scenario directory
///
/// Story paths are recorded relative to `project_root`, so the same project
/// reached through `.`, `./` or an absolute path yields identical records.
pub fn scan_stories(scenario_path: &Path, project_root: &Path) -> Vec<StoryRecord> {
    tracing::info!("Scanning stories in {}", scenario_path.display());

    if !scenario_path.exists() {
        tracing::warn!("Scenario path does not exist: {}", scenario_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = match std::fs::read_dir(scenario_path) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(STORY_EXTENSION))
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Cannot list {}: {e}", scenario_path.display());
            return Vec::new();
        }
    };
    files.sort();
    tracing::debug!("Found {} story files", files.len());

    let stories: Vec<StoryRecord> = files
        .iter()
        .filter_map(|path| scan_story_file(path, project_root).into_record())
        .inspect(|story| tracing::debug!("Scanned story: {}", story.filename))
        .collect();

    tracing::info!("Scanned {} stories", stories.len());
    stories
}

/// Parse a single story file
pub fn scan_story_file(path: &Path, project_root: &Path) -> ScanOutcome<StoryRecord> {
    let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
        return ScanOutcome::skipped(path, "file name is not valid UTF-8");
    };
    let stem = filename.strip_suffix(STORY_EXTENSION).unwrap_or(filename);
    if !follows_naming_convention(filename) {
        tracing::debug!("Story name does not follow wave-epic-story-slug: {filename}");
    }

    let content = match read_text_file(path) {
        Ok(content) => content,
        Err(e) => return ScanOutcome::skipped(path, e),
    };
    let document = match frontmatter::parse(&content) {
        Ok(document) => document,
        Err(e) => return ScanOutcome::skipped(path, e),
    };

    let id = StoryId::from_stem(stem);
    ScanOutcome::Scanned(StoryRecord {
        file_path: relative_path(path, project_root),
        filename: filename.to_string(),
        wave: id.wave,
        epic: id.epic,
        story: id.story,
        slug: id.slug,
        frontmatter: document.metadata,
        content_preview: truncate_chars(&document.body, STORY_EXCERPT_CHARS),
    })
}

/// `path` below `root` with `/` separators; unchanged when outside it
fn relative_path(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().to_string(),
    }
}
