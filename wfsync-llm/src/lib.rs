//! workflow-sync LLM layer
//!
//! Talks to an OpenAI-compatible completion endpoint and turns its answers
//! into validated analysis results:
//! - completion client and cost model
//! - payload extraction with ordered JSON repairs
//! - semantic validation against the scanned stories
//! - retry with exponential backoff
//! - per-scenario analysis, gap detection and the run orchestrator

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod analyzer;
pub mod client;
pub mod gaps;
pub mod prompts;
pub mod response;
pub mod retry;
pub mod runner;
pub mod validation;

pub use analyzer::ScenarioAnalyzer;
pub use client::{Completion, CompletionService, CostModel, OpenAiCompatibleClient, Usage};
pub use gaps::{GapDetection, ScenarioGapDetector};
pub use retry::{AttemptOutcome, Retried, RetryPolicy};
pub use runner::{SyncOutcome, SyncRunner};
pub use validation::ValidationFailure;

/// Result type for LLM operations
pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// Error types for LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the completion endpoint
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response carried no message content
    #[error("Completion service returned no content")]
    EmptyResponse,

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload parsed but failed semantic validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Result cache or key derivation error
    #[error("Cache error: {0}")]
    Cache(wfsync_core::Error),
}

impl From<wfsync_core::Error> for LlmError {
    fn from(err: wfsync_core::Error) -> Self {
        match err {
            wfsync_core::Error::Config(message) => Self::Config(message),
            other => Self::Cache(other),
        }
    }
}
