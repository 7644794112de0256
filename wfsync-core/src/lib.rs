//! workflow-sync core
//!
//! Everything the analyzer needs that does not talk to the completion
//! service:
//! - data model for workflows, stories and analysis results
//! - workflow and story scanners
//! - content fingerprints used as cache keys
//! - the on-disk result cache
//! - the category/scenario coverage table
//! - markdown report rendering

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod cache;
pub mod coverage;
pub mod fingerprint;
pub mod models;
pub mod report;
pub mod scan;
pub mod settings;

pub use cache::{CacheKey, ResultCache};
pub use coverage::CoverageTable;
pub use models::{
    Addition, AnalysisResult, Deletion, Modification, NewScenarioProposal, ScenarioName,
    StoryRecord, SuggestedStory, WorkflowCorpus, WorkflowKind, WorkflowRecord,
};
pub use settings::SyncSettings;

/// Result type used throughout workflow-sync core
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for workflow-sync core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Utility error
    #[error("Utility error: {0}")]
    Util(#[from] wfsync_utils::UtilError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
