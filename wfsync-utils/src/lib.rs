//! workflow-sync utilities
//!
//! Shared plumbing for the workflow-sync crates: logging setup, configuration
//! file loading, credential loading from `.env`, path safety checks and small
//! text helpers.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod file;
pub mod logging;
pub mod string;

pub use config::{load_config, LlmCredentials};
pub use file::{ensure_dir, is_within_root, normalize_path, read_text_file};
pub use string::{mask_secret, truncate_chars};

/// Result type used throughout workflow-sync utilities
pub type Result<T> = std::result::Result<T, UtilError>;

/// Error types for utility operations
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path operation error
    #[error("Path operation error: {0}")]
    PathOperation(String),
}
